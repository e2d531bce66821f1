//! Sample every Nth frame of a video into numbered image files.
//!
//! Usage:
//!   cargo run --example extract_frames -- <input_file> [every]

use std::error::Error;
use std::time::Instant;

use framesplit::{ExtractionConfig, FfmpegLogLevel, FfmpegSource, FrameSource};

fn main() -> Result<(), Box<dyn Error>> {
    let input_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "input.mp4".to_string());
    let every: u64 = match std::env::args().nth(2) {
        Some(value) => value.parse()?,
        None => 30,
    };

    framesplit::set_ffmpeg_log_level(FfmpegLogLevel::Error);

    println!("Probing {input_path}...");
    let info = FfmpegSource::new(&input_path).probe()?;
    println!(
        "Video: {}x{}, {:.2} fps, {} frames",
        info.width, info.height, info.frames_per_second, info.frame_count,
    );

    let config = ExtractionConfig::new(&input_path)
        .with_output_prefix("demo_frames/frame_")
        .with_output_suffix(".png")
        .with_sampling_stride(every);

    println!("Extracting every {every}th frame...");
    let start = Instant::now();
    let report = framesplit::extract_frames(&config)?;
    let elapsed = start.elapsed();

    for worker in report.workers() {
        println!(
            "Worker {} [{}, {}): {} frames, {}",
            worker.worker_index(),
            worker.assignment.range_start,
            worker.assignment.range_end,
            worker.frames_written,
            worker.stop,
        );
    }
    println!(
        "Wrote {} frames to demo_frames/ in {elapsed:.2?}",
        report.frames_written()
    );

    if !report.all_workers_succeeded() {
        println!("Failed workers: {:?}", report.failed_workers());
    }

    Ok(())
}
