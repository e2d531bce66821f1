//! Decode and encode capabilities consumed by workers.
//!
//! Workers never talk to a codec library directly. They see a
//! [`FrameSource`] that can be probed and can hand out independent
//! [`DecodeCursor`]s, and a [`FrameSink`] that encodes an image to a path.
//! [`FfmpegSource`](crate::FfmpegSource) and
//! [`ImageFileSink`](crate::ImageFileSink) are the production
//! implementations.

use std::path::Path;

use image::DynamicImage;

use crate::error::SplitError;

/// Stream facts read once by the coordinator's probe.
#[derive(Debug, Clone, Copy, PartialEq)]
#[must_use]
pub struct SourceInfo {
    /// Total number of frames in decode order.
    pub frame_count: u64,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Average frame rate; may be approximate for variable-frame-rate content.
    pub frames_per_second: f64,
}

/// A video that can be probed and opened any number of times.
///
/// Shared by reference across all worker threads, hence `Sync`. Cursors are
/// created and dropped on the worker thread that uses them and need not be
/// `Send`.
pub trait FrameSource: Sync {
    /// Cursor type handed to each worker.
    type Cursor: DecodeCursor;

    /// Path of the underlying video, used in run logs and
    /// [`RunReport::source_path`](crate::RunReport::source_path).
    fn path(&self) -> &Path;

    /// Open the video once and read its stream facts.
    ///
    /// # Errors
    ///
    /// [`SplitError::SourceUnavailable`] if the video cannot be opened or
    /// reports no usable frame count.
    fn probe(&self) -> Result<SourceInfo, SplitError>;

    /// Open a fresh cursor positioned before the first frame.
    ///
    /// # Errors
    ///
    /// [`SplitError::SourceUnavailable`] if the video cannot be opened.
    fn open_cursor(&self) -> Result<Self::Cursor, SplitError>;
}

/// An independent, seekable position in a video's frame sequence.
pub trait DecodeCursor {
    /// Make every subsequently decoded frame `width` x `height`.
    fn set_output_size(&mut self, width: u32, height: u32) -> Result<(), SplitError>;

    /// Position the cursor so the next [`read_frame`](Self::read_frame)
    /// returns the frame at absolute index `frame_number`.
    ///
    /// # Errors
    ///
    /// [`SplitError::SeekFailure`] if the position cannot be reached.
    fn seek(&mut self, frame_number: u64) -> Result<(), SplitError>;

    /// Decode the frame at the current position.
    ///
    /// Returns `Ok(None)` when the stream has no frame there.
    fn read_frame(&mut self) -> Result<Option<DynamicImage>, SplitError>;
}

/// Encodes a decoded frame to a file.
pub trait FrameSink: Sync {
    /// Write `image` to `path`.
    ///
    /// # Errors
    ///
    /// [`SplitError::EncodeFailure`] if the image cannot be written.
    fn write(&self, image: &DynamicImage, path: &Path) -> Result<(), SplitError>;
}

impl<T: FrameSource + ?Sized> FrameSource for &T {
    type Cursor = T::Cursor;

    fn path(&self) -> &Path {
        (**self).path()
    }

    fn probe(&self) -> Result<SourceInfo, SplitError> {
        (**self).probe()
    }

    fn open_cursor(&self) -> Result<Self::Cursor, SplitError> {
        (**self).open_cursor()
    }
}

impl<T: FrameSink + ?Sized> FrameSink for &T {
    fn write(&self, image: &DynamicImage, path: &Path) -> Result<(), SplitError> {
        (**self).write(image, path)
    }
}
