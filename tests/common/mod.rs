//! In-memory source and sink doubles shared by the integration tests.

#![allow(dead_code)]

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use framesplit::{DecodeCursor, FrameSink, FrameSource, SourceInfo, SplitError};
use image::{DynamicImage, Rgb, RgbImage};

/// A fake video of `frame_count` frames of `width` x `height`.
pub struct MockSource {
    pub path: PathBuf,
    /// `None` makes the probe fail.
    pub frame_count: Option<u64>,
    pub width: u32,
    pub height: u32,
    /// The first `fail_opens` cursor opens fail.
    pub fail_opens: usize,
    /// A seek to exactly this frame is rejected.
    pub seek_fail_at: Option<u64>,
    /// Reads at or past this frame return no frame.
    pub empty_from: Option<u64>,
    /// Cursors ignore `set_output_size` and keep decoding at source size.
    pub ignore_output_size: bool,
    pub probes: AtomicUsize,
    pub opens: AtomicUsize,
}

impl MockSource {
    pub fn new(frame_count: u64) -> Self {
        Self {
            path: PathBuf::from("mock.mov"),
            frame_count: Some(frame_count),
            width: 64,
            height: 36,
            fail_opens: 0,
            seek_fail_at: None,
            empty_from: None,
            ignore_output_size: false,
            probes: AtomicUsize::new(0),
            opens: AtomicUsize::new(0),
        }
    }

    pub fn unopenable() -> Self {
        Self {
            frame_count: None,
            ..Self::new(0)
        }
    }

    fn unavailable(&self, reason: &str) -> SplitError {
        SplitError::SourceUnavailable {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }
}

impl FrameSource for MockSource {
    type Cursor = MockCursor;

    fn path(&self) -> &Path {
        &self.path
    }

    fn probe(&self) -> Result<SourceInfo, SplitError> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        let frame_count = self
            .frame_count
            .ok_or_else(|| self.unavailable("cannot open"))?;
        Ok(SourceInfo {
            frame_count,
            width: self.width,
            height: self.height,
            frames_per_second: 30.0,
        })
    }

    fn open_cursor(&self) -> Result<MockCursor, SplitError> {
        let attempt = self.opens.fetch_add(1, Ordering::SeqCst);
        if self.frame_count.is_none() || attempt < self.fail_opens {
            return Err(self.unavailable("cannot open"));
        }
        Ok(MockCursor {
            position: 0,
            frame_count: self.frame_count.unwrap_or(0),
            width: self.width,
            height: self.height,
            output_size: None,
            seek_fail_at: self.seek_fail_at,
            empty_from: self.empty_from,
            ignore_output_size: self.ignore_output_size,
        })
    }
}

pub struct MockCursor {
    position: u64,
    frame_count: u64,
    width: u32,
    height: u32,
    output_size: Option<(u32, u32)>,
    seek_fail_at: Option<u64>,
    empty_from: Option<u64>,
    ignore_output_size: bool,
}

impl DecodeCursor for MockCursor {
    fn set_output_size(&mut self, width: u32, height: u32) -> Result<(), SplitError> {
        if !self.ignore_output_size {
            self.output_size = Some((width, height));
        }
        Ok(())
    }

    fn seek(&mut self, frame_number: u64) -> Result<(), SplitError> {
        if self.seek_fail_at == Some(frame_number) {
            return Err(SplitError::SeekFailure {
                frame_number,
                reason: "rejected by mock".to_string(),
            });
        }
        self.position = frame_number;
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Option<DynamicImage>, SplitError> {
        if self.position >= self.frame_count
            || self.empty_from.is_some_and(|from| self.position >= from)
        {
            return Ok(None);
        }
        let (width, height) = self.output_size.unwrap_or((self.width, self.height));
        let shade = (self.position % 256) as u8;
        let image = RgbImage::from_pixel(width, height, Rgb([shade, shade, shade]));
        self.position += 1;
        Ok(Some(DynamicImage::ImageRgb8(image)))
    }
}

/// Records every write instead of touching the filesystem.
#[derive(Default)]
pub struct MemorySink {
    pub written: Mutex<Vec<(PathBuf, u32, u32)>>,
    pub fail_paths: HashSet<PathBuf>,
}

impl MemorySink {
    pub fn failing_on(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            written: Mutex::default(),
            fail_paths: paths.into_iter().collect(),
        }
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self
            .written
            .lock()
            .unwrap()
            .iter()
            .map(|(path, _, _)| path.clone())
            .collect();
        paths.sort();
        paths
    }

    pub fn sizes(&self) -> Vec<(u32, u32)> {
        self.written
            .lock()
            .unwrap()
            .iter()
            .map(|(_, width, height)| (*width, *height))
            .collect()
    }
}

impl FrameSink for MemorySink {
    fn write(&self, image: &DynamicImage, path: &Path) -> Result<(), SplitError> {
        if self.fail_paths.contains(path) {
            return Err(SplitError::EncodeFailure {
                path: path.to_path_buf(),
                reason: "disk full".to_string(),
            });
        }
        self.written
            .lock()
            .unwrap()
            .push((path.to_path_buf(), image.width(), image.height()));
        Ok(())
    }
}

/// Sorted frame indices recovered from paths written with `prefix` and `.png`.
pub fn written_indices(sink: &MemorySink, prefix: &str) -> Vec<u64> {
    let mut indices: Vec<u64> = sink
        .paths()
        .iter()
        .map(|path| {
            let name = path.to_string_lossy();
            name.strip_prefix(prefix)
                .and_then(|rest| rest.strip_suffix(".png"))
                .and_then(|digits| digits.parse().ok())
                .unwrap_or_else(|| panic!("unexpected output path {name}"))
        })
        .collect();
    indices.sort_unstable();
    indices
}
