//! Error types for the `framesplit` crate.
//!
//! [`SplitError`] is returned by every fallible operation. Which scope an
//! error terminates depends on where it is raised: a probe failure aborts the
//! whole run before any worker exists, an open or seek failure ends a single
//! worker, and an encode failure only costs one output file.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `framesplit` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SplitError {
    /// The video could not be opened, has no video stream, or reported an
    /// unusable frame count.
    #[error("Source unavailable at {path}: {reason}")]
    SourceUnavailable {
        /// Path of the video that was being opened.
        path: PathBuf,
        /// Underlying reason the open or probe failed.
        reason: String,
    },

    /// Partitioning produced no work: the video has zero frames or the pool
    /// has zero workers.
    #[error("Nothing to do: {total_frames} frames across {worker_count} workers")]
    NothingToDo {
        /// Frame count reported by the probe.
        total_frames: u64,
        /// Worker count after applying the cap.
        worker_count: usize,
    },

    /// A sampling stride of zero was configured.
    #[error("Sampling stride must be greater than zero")]
    InvalidStride,

    /// The decoder rejected a seek to an absolute frame position.
    #[error("Seek to frame {frame_number} failed: {reason}")]
    SeekFailure {
        /// The frame index the worker tried to reach.
        frame_number: u64,
        /// Reason reported by the decoder.
        reason: String,
    },

    /// A read at the current position produced no frame.
    #[error("No frame decoded at frame {frame_number}")]
    DecodeEmpty {
        /// The frame index the worker was positioned at.
        frame_number: u64,
    },

    /// Writing an output image failed.
    #[error("Failed to encode frame to {path}: {reason}")]
    EncodeFailure {
        /// Destination path of the image.
        path: PathBuf,
        /// Underlying encoder or I/O message.
        reason: String,
    },

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while preparing the output directory.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate during frame conversion.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),
}

impl From<FfmpegError> for SplitError {
    fn from(error: FfmpegError) -> Self {
        SplitError::FfmpegError(error.to_string())
    }
}
