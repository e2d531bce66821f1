//! Progress reporting.
//!
//! Workers report every written frame to a [`ProgressCallback`]. The
//! callback is shared by reference across all worker threads and only
//! observes; it cannot stop a run.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::{
//!     Arc,
//!     atomic::{AtomicU64, Ordering},
//! };
//!
//! use framesplit::{ExtractionConfig, FrameProgress, ProgressCallback};
//!
//! #[derive(Default)]
//! struct CountFrames(AtomicU64);
//!
//! impl ProgressCallback for CountFrames {
//!     fn on_frame(&self, progress: &FrameProgress<'_>) {
//!         let done = self.0.fetch_add(1, Ordering::Relaxed) + 1;
//!         println!("worker {} wrote frame {} ({done} total)", progress.worker_index, progress.frame_number);
//!     }
//! }
//!
//! let config = ExtractionConfig::new("input.mp4")
//!     .with_sampling_stride(30)
//!     .with_progress(Arc::new(CountFrames::default()));
//! ```

use std::path::Path;

/// A single written frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameProgress<'a> {
    /// Index of the worker that wrote the frame.
    pub worker_index: usize,
    /// Global frame index of the written frame.
    pub frame_number: u64,
    /// Path the frame was written to.
    pub path: &'a Path,
}

/// Receives progress notifications from worker threads.
///
/// Implementations must be [`Send`] and [`Sync`] because they are called
/// concurrently from every worker.
pub trait ProgressCallback: Send + Sync {
    /// Called after a frame has been written successfully.
    fn on_frame(&self, progress: &FrameProgress<'_>);
}

/// Discards all notifications. The default when no callback is configured.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_frame(&self, _progress: &FrameProgress<'_>) {}
}
