use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use colored::Colorize;
use framesplit::{
    Coordinator, ExtractionConfig, FfmpegLogLevel, FfmpegSource, FrameProgress, ImageFileSink,
    PixelFormat, ProgressCallback, RunReport,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;

const CLI_AFTER_HELP: &str = "Examples:\n  framesplit srcVideo.mov --out-prefix frames/negCase3_ --every 30\n  framesplit input.mp4 --every 10 --width 640 --height 360 --max-workers 16 --progress\n  framesplit input.mp4 --suffix .jpg --json";

#[derive(Debug, Parser)]
#[command(
    name = "framesplit",
    version,
    about = "Sample still frames from a video with one decode worker per core",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    /// Input video path.
    input: PathBuf,

    /// Output filename prefix; may include directories.
    #[arg(long, default_value = "frames/frame_")]
    out_prefix: String,

    /// Output filename suffix; the extension selects the image format.
    #[arg(long, default_value = ".png")]
    suffix: String,

    /// Sample every Nth frame (1 samples every frame).
    #[arg(long, default_value_t = 30)]
    every: u64,

    /// Fixed output width in pixels.
    #[arg(long)]
    width: Option<u32>,

    /// Fixed output height in pixels.
    #[arg(long)]
    height: Option<u32>,

    /// Upper bound on the number of workers.
    #[arg(long)]
    max_workers: Option<usize>,

    /// Output pixel format (rgb8, rgba8, gray8).
    #[arg(long, default_value = "rgb8")]
    pixel_format: String,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long, default_value = "error")]
    ffmpeg_log_level: String,

    /// Show a progress bar.
    #[arg(long)]
    progress: bool,

    /// Print the run report as JSON.
    #[arg(long)]
    json: bool,

    /// Show debug logging.
    #[arg(long)]
    verbose: bool,

    /// Exit non-zero if any worker failed.
    #[arg(long)]
    strict: bool,
}

fn parse_pixel_format(value: &str) -> Option<PixelFormat> {
    match value.to_ascii_lowercase().as_str() {
        "rgb8" | "rgb" => Some(PixelFormat::Rgb8),
        "rgba8" | "rgba" => Some(PixelFormat::Rgba8),
        "gray8" | "gray" | "greyscale" | "grayscale" => Some(PixelFormat::Gray8),
        _ => None,
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .try_init()
        .ok();
}

struct TerminalProgress {
    bar: ProgressBar,
}

impl ProgressCallback for TerminalProgress {
    fn on_frame(&self, _progress: &FrameProgress<'_>) {
        self.bar.inc(1);
    }
}

fn progress_bar(total: u64) -> ProgressBar {
    let bar = ProgressBar::new(total);
    if let Ok(style) =
        ProgressStyle::with_template("{spinner} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} frames")
    {
        bar.set_style(style);
    }
    bar
}

fn report_json(report: &RunReport) -> serde_json::Value {
    let plan = report.plan();
    json!({
        "source": report.source_path().display().to_string(),
        "total_frames": plan.total_frames(),
        "worker_count": plan.worker_count(),
        "frames_per_worker": plan.frames_per_worker(),
        "sampling_stride": plan.sampling_stride(),
        "dropped_frames": plan.dropped_frames(),
        "frames_written": report.frames_written(),
        "write_failures": report.write_failures(),
        "failed_workers": report.failed_workers(),
        "workers": report.workers().map(|worker| json!({
            "index": worker.worker_index(),
            "range_start": worker.assignment.range_start,
            "range_end": worker.assignment.range_end,
            "frames_written": worker.frames_written,
            "write_failures": worker.write_failures,
            "status": worker.status(),
            "stop": worker.stop.to_string(),
            "error": worker.error.as_ref().map(ToString::to_string),
        })).collect::<Vec<_>>(),
    })
}

fn print_summary(report: &RunReport) {
    let plan = report.plan();
    println!(
        "{} {} frames from {} ({} workers x {} frames, every {})",
        "done".green().bold(),
        report.frames_written(),
        plan.total_frames(),
        plan.worker_count(),
        plan.frames_per_worker(),
        plan.sampling_stride(),
    );
    if plan.dropped_frames() > 0 {
        println!(
            "{} last {} frames were not assigned to any worker",
            "note:".cyan().bold(),
            plan.dropped_frames()
        );
    }
    if report.write_failures() > 0 {
        eprintln!(
            "{} {} frames could not be written",
            "warning:".yellow().bold(),
            report.write_failures()
        );
    }
    for index in report.failed_workers() {
        let detail = report
            .worker(index)
            .and_then(|worker| worker.error.as_ref())
            .map_or_else(|| "no report".to_string(), ToString::to_string);
        eprintln!(
            "{} worker {index} failed: {detail}",
            "warning:".yellow().bold()
        );
    }
}

fn run() -> Result<bool, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let level: FfmpegLogLevel = cli.ffmpeg_log_level.parse()?;
    framesplit::set_ffmpeg_log_level(level);

    let pixel_format = parse_pixel_format(&cli.pixel_format)
        .ok_or(format!("unsupported --pixel-format: {}", cli.pixel_format))?;

    let mut config = ExtractionConfig::new(&cli.input)
        .with_output_prefix(cli.out_prefix.as_str())
        .with_output_suffix(cli.suffix.as_str())
        .with_sampling_stride(cli.every)
        .with_resolution(cli.width, cli.height)
        .with_pixel_format(pixel_format);
    if let Some(cap) = cli.max_workers {
        config = config.with_max_workers(cap);
    }

    let source = FfmpegSource::new(&cli.input).with_pixel_format(pixel_format);

    let (plan, source_info) = Coordinator::new(&config, &source, ImageFileSink).plan()?;

    let bar = cli.progress.then(|| progress_bar(plan.expected_samples()));
    if let Some(bar) = &bar {
        config = config.with_progress(Arc::new(TerminalProgress { bar: bar.clone() }));
    }

    let report =
        Coordinator::new(&config, &source, ImageFileSink).run_planned(plan, source_info)?;

    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report_json(&report))?);
    } else {
        print_summary(&report);
    }

    Ok(!cli.strict || report.all_workers_succeeded())
}

fn main() {
    match run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(2),
        Err(error) => {
            eprintln!("{} {error}", "error:".red().bold());
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::{Cli, parse_pixel_format};

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_pixel_format_aliases() {
        assert!(parse_pixel_format("rgb8").is_some());
        assert!(parse_pixel_format("RGBA").is_some());
        assert!(parse_pixel_format("grayscale").is_some());
        assert!(parse_pixel_format("yuv420p").is_none());
    }

    #[test]
    fn defaults_match_documented_behaviour() {
        let cli = <Cli as clap::Parser>::parse_from(["framesplit", "in.mov"]);
        assert_eq!(cli.every, 30);
        assert_eq!(cli.out_prefix, "frames/frame_");
        assert_eq!(cli.suffix, ".png");
        assert!(cli.max_workers.is_none());
    }
}
