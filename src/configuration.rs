//! Run configuration.
//!
//! [`ExtractionConfig`] is an immutable description of one extraction run.
//! It is built once, validated, and then only read: every worker borrows the
//! same value.
//!
//! # Example
//!
//! ```no_run
//! use framesplit::{ExtractionConfig, PixelFormat};
//!
//! let config = ExtractionConfig::new("input.mov")
//!     .with_output_prefix("frames/negCase3_")
//!     .with_output_suffix(".png")
//!     .with_sampling_stride(30)
//!     .with_resolution(Some(640), Some(360))
//!     .with_pixel_format(PixelFormat::Rgb8)
//!     .with_max_workers(16);
//!
//! let report = framesplit::extract_frames(&config)?;
//! println!("{} frames written", report.frames_written());
//! # Ok::<(), framesplit::SplitError>(())
//! ```

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    sync::Arc,
};

use ffmpeg_next::format::Pixel;

use crate::{
    error::SplitError,
    naming::OutputNaming,
    progress::{NoOpProgress, ProgressCallback},
};

/// Output pixel format for extracted frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelFormat {
    /// 8-bit RGB (24 bpp). This is the default.
    #[default]
    Rgb8,
    /// 8-bit RGBA with alpha pre-set to 255 (32 bpp).
    Rgba8,
    /// 8-bit grayscale (8 bpp).
    Gray8,
}

impl PixelFormat {
    /// Map to the corresponding FFmpeg pixel format constant.
    pub(crate) fn to_ffmpeg_pixel(self) -> Pixel {
        match self {
            PixelFormat::Rgb8 => Pixel::RGB24,
            PixelFormat::Rgba8 => Pixel::RGBA,
            PixelFormat::Gray8 => Pixel::GRAY8,
        }
    }

    /// Bytes per pixel in a tightly packed buffer of this format.
    pub(crate) fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgb8 => 3,
            PixelFormat::Rgba8 => 4,
            PixelFormat::Gray8 => 1,
        }
    }
}

/// Fixed output resolution for sampled frames.
///
/// With no dimensions set, frames keep the source resolution. Setting one
/// dimension together with `maintain_aspect_ratio` derives the other from the
/// source size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameOutputOptions {
    /// Target width. `None` keeps the source width.
    pub width: Option<u32>,
    /// Target height. `None` keeps the source height.
    pub height: Option<u32>,
    /// Derive the missing dimension from the source aspect ratio.
    pub maintain_aspect_ratio: bool,
}

impl Default for FrameOutputOptions {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            maintain_aspect_ratio: true,
        }
    }
}

impl FrameOutputOptions {
    /// Returns `true` if any dimension was configured.
    pub fn is_fixed(&self) -> bool {
        self.width.is_some() || self.height.is_some()
    }

    /// Resolve the final `(width, height)` given the source size.
    ///
    /// Returns `None` when no dimension is configured, meaning frames keep
    /// whatever size the decoder produces.
    pub fn resolve(&self, source_width: u32, source_height: u32) -> Option<(u32, u32)> {
        let dimensions = match (self.width, self.height) {
            (None, None) => return None,
            (Some(w), Some(h)) => (w, h),
            (Some(w), None) if self.maintain_aspect_ratio && source_width > 0 => {
                let ratio = w as f64 / source_width as f64;
                (w, ((source_height as f64 * ratio).round() as u32).max(1))
            }
            (Some(w), None) => (w, source_height),
            (None, Some(h)) if self.maintain_aspect_ratio && source_height > 0 => {
                let ratio = h as f64 / source_height as f64;
                (((source_width as f64 * ratio).round() as u32).max(1), h)
            }
            (None, Some(h)) => (source_width, h),
        };
        Some((dimensions.0.max(1), dimensions.1.max(1)))
    }
}

/// Everything a run needs besides the codec implementation itself.
#[derive(Clone)]
pub struct ExtractionConfig {
    pub(crate) source_path: PathBuf,
    pub(crate) naming: OutputNaming,
    pub(crate) sampling_stride: u64,
    pub(crate) frame_output: FrameOutputOptions,
    pub(crate) pixel_format: PixelFormat,
    pub(crate) max_workers: Option<usize>,
    pub(crate) progress: Arc<dyn ProgressCallback>,
}

impl Debug for ExtractionConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ExtractionConfig")
            .field("source_path", &self.source_path)
            .field("naming", &self.naming)
            .field("sampling_stride", &self.sampling_stride)
            .field("frame_output", &self.frame_output)
            .field("pixel_format", &self.pixel_format)
            .field("max_workers", &self.max_workers)
            .finish_non_exhaustive()
    }
}

impl ExtractionConfig {
    /// Create a configuration for `source_path` with default settings.
    ///
    /// Defaults: prefix `frames/frame_`, suffix `.png`, stride 1 (every
    /// frame), source resolution, RGB8, one worker per available core.
    pub fn new<P: AsRef<Path>>(source_path: P) -> Self {
        Self {
            source_path: source_path.as_ref().to_path_buf(),
            naming: OutputNaming::default(),
            sampling_stride: 1,
            frame_output: FrameOutputOptions::default(),
            pixel_format: PixelFormat::default(),
            max_workers: None,
            progress: Arc::new(NoOpProgress),
        }
    }

    /// Set the output filename prefix. May include directories.
    #[must_use]
    pub fn with_output_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.naming = OutputNaming::new(prefix, self.naming.suffix());
        self
    }

    /// Set the output filename suffix. The extension picks the image format.
    #[must_use]
    pub fn with_output_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.naming = OutputNaming::new(self.naming.prefix(), suffix);
        self
    }

    /// Sample every `stride`-th frame. 1 samples every frame.
    ///
    /// Zero is rejected by [`validate`](Self::validate).
    #[must_use]
    pub fn with_sampling_stride(mut self, stride: u64) -> Self {
        self.sampling_stride = stride;
        self
    }

    /// Resize every sampled frame to a fixed resolution.
    #[must_use]
    pub fn with_resolution(mut self, width: Option<u32>, height: Option<u32>) -> Self {
        self.frame_output.width = width;
        self.frame_output.height = height;
        self
    }

    /// Control whether a single configured dimension keeps the source aspect
    /// ratio. Defaults to `true`.
    #[must_use]
    pub fn with_maintain_aspect_ratio(mut self, maintain: bool) -> Self {
        self.frame_output.maintain_aspect_ratio = maintain;
        self
    }

    /// Set the output pixel format.
    #[must_use]
    pub fn with_pixel_format(mut self, format: PixelFormat) -> Self {
        self.pixel_format = format;
        self
    }

    /// Cap the worker pool. The pool never exceeds available parallelism.
    #[must_use]
    pub fn with_max_workers(mut self, cap: usize) -> Self {
        self.max_workers = Some(cap);
        self
    }

    /// Attach a progress callback, invoked from worker threads.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Path of the source video.
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// Output naming scheme.
    pub fn naming(&self) -> &OutputNaming {
        &self.naming
    }

    /// Configured sampling stride.
    pub fn sampling_stride(&self) -> u64 {
        self.sampling_stride
    }

    /// Configured output resolution.
    pub fn frame_output(&self) -> FrameOutputOptions {
        self.frame_output
    }

    /// Configured pixel format.
    pub fn pixel_format(&self) -> PixelFormat {
        self.pixel_format
    }

    /// Configured worker cap, if any.
    pub fn max_workers(&self) -> Option<usize> {
        self.max_workers
    }

    /// Check settings that can be rejected before touching the video.
    ///
    /// # Errors
    ///
    /// [`SplitError::InvalidStride`] for a zero stride.
    pub fn validate(&self) -> Result<(), SplitError> {
        if self.sampling_stride == 0 {
            return Err(SplitError::InvalidStride);
        }
        Ok(())
    }
}
