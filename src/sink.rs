//! Image file output.

use std::path::Path;

use image::DynamicImage;

use crate::{error::SplitError, source::FrameSink};

/// Writes frames with the `image` crate, inferring the format from the file
/// extension (`.png`, `.jpg`, `.bmp`, `.tiff`, ...).
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageFileSink;

impl FrameSink for ImageFileSink {
    fn write(&self, image: &DynamicImage, path: &Path) -> Result<(), SplitError> {
        image.save(path).map_err(|error| SplitError::EncodeFailure {
            path: path.to_path_buf(),
            reason: error.to_string(),
        })
    }
}
