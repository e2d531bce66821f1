//! # framesplit
//!
//! Sample still frames from a video file with a fixed pool of decode
//! workers.
//!
//! The frame range `[0, total_frames)` is split into one contiguous,
//! equally sized slice per worker. Every worker opens its own decode cursor
//! on the same file, seeks through its slice at the sampling stride and
//! writes each sampled frame to `<prefix><5-digit frame index><suffix>`.
//! Because slices are disjoint, output names never collide.
//!
//! ## Quick Start
//!
//! ```no_run
//! use framesplit::ExtractionConfig;
//!
//! let config = ExtractionConfig::new("input.mov")
//!     .with_output_prefix("frames/negCase3_")
//!     .with_output_suffix(".png")
//!     .with_sampling_stride(30)
//!     .with_resolution(Some(640), Some(360));
//!
//! let report = framesplit::extract_frames(&config)?;
//! println!(
//!     "{} frames from {} workers",
//!     report.frames_written(),
//!     report.plan().worker_count(),
//! );
//! # Ok::<(), framesplit::SplitError>(())
//! ```
//!
//! ## Partitioning rules
//!
//! - `frames_per_worker = total_frames / worker_count`; the remainder at the
//!   end of the video is never sampled.
//! - Worker `i` owns `[i * frames_per_worker, (i + 1) * frames_per_worker)`
//!   and samples `start + stride`, `start + 2 * stride`, ... below the end.
//! - The pool size is the machine's available parallelism, optionally
//!   capped with [`ExtractionConfig::with_max_workers`].
//!
//! Decoding and encoding sit behind the [`FrameSource`], [`DecodeCursor`]
//! and [`FrameSink`] traits. [`FfmpegSource`] and [`ImageFileSink`] are the
//! built-in implementations.
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed for `ffmpeg-next` to
//! build.

pub mod configuration;
pub mod coordinator;
pub mod error;
pub mod ffmpeg;
pub mod naming;
pub mod partition;
pub mod progress;
pub mod sink;
pub mod source;
mod utilities;
pub mod video;
pub mod worker;

pub use configuration::{ExtractionConfig, FrameOutputOptions, PixelFormat};
pub use coordinator::{Coordinator, RunReport, extract_frames};
pub use error::SplitError;
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use naming::OutputNaming;
pub use partition::{PartitionPlan, SampleIndices, WorkerAssignment, worker_count};
pub use progress::{FrameProgress, ProgressCallback};
pub use sink::ImageFileSink;
pub use source::{DecodeCursor, FrameSink, FrameSource, SourceInfo};
pub use video::{FfmpegCursor, FfmpegSource};
pub use worker::{StopReason, WorkerReport};
