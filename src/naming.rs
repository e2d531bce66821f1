//! Output filename construction.
//!
//! Output files are named `<prefix><index><suffix>` where the index is the
//! global frame number zero-padded to [`INDEX_WIDTH`] digits, e.g.
//! `frames/clip_00930.png`. Indices wider than the pad width are written in
//! full. Because worker ranges are disjoint, names never collide across
//! workers.

use std::path::{Path, PathBuf};

/// Minimum number of digits in the frame index part of a filename.
pub const INDEX_WIDTH: usize = 5;

/// Prefix and suffix used to derive output paths from frame indices.
///
/// Every call to [`path_for`](OutputNaming::path_for) formats into a fresh
/// buffer, so one `OutputNaming` can be shared by all workers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputNaming {
    prefix: String,
    suffix: String,
}

impl Default for OutputNaming {
    fn default() -> Self {
        Self::new("frames/frame_", ".png")
    }
}

impl OutputNaming {
    /// Create a naming scheme. The prefix may contain directory components.
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    /// The filename prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The filename suffix (usually an extension including the dot).
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Output path for the frame at `frame_number`.
    pub fn path_for(&self, frame_number: u64) -> PathBuf {
        PathBuf::from(format!(
            "{}{:0width$}{}",
            self.prefix,
            frame_number,
            self.suffix,
            width = INDEX_WIDTH,
        ))
    }

    /// Directory that output files land in, if the prefix names one.
    ///
    /// A prefix ending in a separator (`"frames/"`) is a directory itself.
    pub fn output_directory(&self) -> Option<PathBuf> {
        if self.prefix.ends_with('/') || self.prefix.ends_with(std::path::MAIN_SEPARATOR) {
            return Some(PathBuf::from(&self.prefix));
        }
        Path::new(&self.prefix)
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(Path::to_path_buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_to_five_digits() {
        let naming = OutputNaming::new("frames/negCase3_", ".png");
        assert_eq!(
            naming.path_for(930),
            PathBuf::from("frames/negCase3_00930.png")
        );
        assert_eq!(naming.path_for(0), PathBuf::from("frames/negCase3_00000.png"));
    }

    #[test]
    fn wide_indices_are_not_truncated() {
        let naming = OutputNaming::new("f", ".jpg");
        assert_eq!(naming.path_for(1_234_567), PathBuf::from("f1234567.jpg"));
    }

    #[test]
    fn output_directory_from_prefix() {
        assert_eq!(
            OutputNaming::new("out/frames/clip_", ".png").output_directory(),
            Some(PathBuf::from("out/frames"))
        );
        assert_eq!(
            OutputNaming::new("frames/", ".png").output_directory(),
            Some(PathBuf::from("frames/"))
        );
        assert_eq!(OutputNaming::new("clip_", ".png").output_directory(), None);
    }
}
