//! End-to-end extraction through FFmpeg and the `image` encoder.
//!
//! Tests require fixture files from `tests/fixtures/generate_fixtures.sh`
//! and return early when they are missing.

use std::{fs, path::Path};

use framesplit::{
    DecodeCursor, ExtractionConfig, FfmpegSource, FrameSource, PixelFormat, extract_frames,
};

const SAMPLE_VIDEO: &str = "tests/fixtures/sample_video.mp4";

#[test]
fn probe_reports_frames_and_dimensions() {
    if !Path::new(SAMPLE_VIDEO).exists() {
        return;
    }

    let info = FfmpegSource::new(SAMPLE_VIDEO)
        .probe()
        .expect("Failed to probe fixture");
    assert!(info.frame_count > 0);
    assert!(info.width > 0 && info.height > 0);
    assert!(info.frames_per_second > 0.0);
}

#[test]
fn cursors_are_independent() {
    if !Path::new(SAMPLE_VIDEO).exists() {
        return;
    }

    let source = FfmpegSource::new(SAMPLE_VIDEO);
    let mut first = source.open_cursor().expect("Failed to open first cursor");
    let mut second = source.open_cursor().expect("Failed to open second cursor");

    first.seek(20).expect("Failed to seek first cursor");
    second.seek(0).expect("Failed to seek second cursor");

    assert!(first.read_frame().expect("first read").is_some());
    assert!(second.read_frame().expect("second read").is_some());
}

#[test]
fn fixed_output_size_and_pixel_format() {
    if !Path::new(SAMPLE_VIDEO).exists() {
        return;
    }

    let source = FfmpegSource::new(SAMPLE_VIDEO).with_pixel_format(PixelFormat::Gray8);
    let mut cursor = source.open_cursor().expect("Failed to open cursor");
    cursor.set_output_size(160, 90).expect("Failed to set size");
    cursor.seek(5).expect("Failed to seek");

    let image = cursor
        .read_frame()
        .expect("Failed to read")
        .expect("Expected a frame");
    assert_eq!((image.width(), image.height()), (160, 90));
    assert!(matches!(image, image::DynamicImage::ImageLuma8(_)));
}

#[test]
fn extract_frames_writes_disjoint_sampled_files() {
    if !Path::new(SAMPLE_VIDEO).exists() {
        return;
    }

    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let output_directory = temporary_directory.path().join("frames");
    let prefix = format!("{}/sample_", output_directory.display());

    let config = ExtractionConfig::new(SAMPLE_VIDEO)
        .with_output_prefix(prefix.as_str())
        .with_output_suffix(".png")
        .with_sampling_stride(10)
        .with_resolution(Some(64), Some(36))
        .with_max_workers(2);

    let report = extract_frames(&config).expect("Extraction failed");
    assert!(report.all_workers_succeeded());
    assert!(report.frames_written() > 0);

    let mut written = 0;
    for entry in fs::read_dir(&output_directory).expect("Output directory missing") {
        let path = entry.expect("Failed to read entry").path();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        let digits = name
            .strip_prefix("sample_")
            .and_then(|rest| rest.strip_suffix(".png"))
            .expect("Unexpected file name");
        assert_eq!(digits.len(), 5);

        let index: u64 = digits.parse().expect("Index is not numeric");
        let owners = report
            .plan()
            .assignments()
            .filter(|assignment| assignment.contains(index))
            .count();
        assert_eq!(owners, 1, "frame {index} is not owned by exactly one worker");

        let image = image::open(&path).expect("Failed to reopen frame");
        assert_eq!((image.width(), image.height()), (64, 36));
        written += 1;
    }

    assert_eq!(written, report.frames_written());
}
