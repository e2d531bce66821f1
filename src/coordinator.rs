//! Run coordination.
//!
//! The [`Coordinator`] probes the source once, builds the
//! [`PartitionPlan`], spawns one OS thread per worker and joins them all.
//! Nothing is shared between workers except the index counter, and a failing
//! worker never stops its siblings.
//!
//! # Example
//!
//! ```no_run
//! use framesplit::{Coordinator, ExtractionConfig, FfmpegSource, ImageFileSink};
//!
//! let config = ExtractionConfig::new("input.mp4")
//!     .with_output_prefix("frames/clip_")
//!     .with_sampling_stride(30)
//!     .with_max_workers(4);
//!
//! let source = FfmpegSource::new(config.source_path());
//! let report = Coordinator::new(&config, source, ImageFileSink).run()?;
//! for worker in report.workers() {
//!     println!("worker {}: {} frames", worker.worker_index(), worker.frames_written);
//! }
//! # Ok::<(), framesplit::SplitError>(())
//! ```

use std::{
    fs,
    path::{Path, PathBuf},
    thread,
};

use crate::{
    configuration::ExtractionConfig,
    error::SplitError,
    partition::{self, PartitionPlan},
    sink::ImageFileSink,
    source::{FrameSink, FrameSource, SourceInfo},
    video::FfmpegSource,
    worker::{WorkerContext, WorkerIndexCounter, WorkerReport, run_worker},
};

/// Result of a run that got past probing and partitioning.
#[derive(Debug)]
pub struct RunReport {
    source_path: PathBuf,
    plan: PartitionPlan,
    source_info: SourceInfo,
    workers: Vec<Option<WorkerReport>>,
}

impl RunReport {
    /// Path of the video the run read.
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// The plan the run used.
    pub fn plan(&self) -> &PartitionPlan {
        &self.plan
    }

    /// What the probe found.
    pub fn source_info(&self) -> &SourceInfo {
        &self.source_info
    }

    /// Reports of all workers that returned, in worker-index order.
    pub fn workers(&self) -> impl Iterator<Item = &WorkerReport> {
        self.workers.iter().flatten()
    }

    /// Report of the worker with `worker_index`, if it returned.
    pub fn worker(&self, worker_index: usize) -> Option<&WorkerReport> {
        self.workers.get(worker_index).and_then(Option::as_ref)
    }

    /// Total frames written across all workers.
    pub fn frames_written(&self) -> u64 {
        self.workers().map(|worker| worker.frames_written).sum()
    }

    /// Total frames that decoded but failed to write.
    pub fn write_failures(&self) -> u64 {
        self.workers().map(|worker| worker.write_failures).sum()
    }

    /// Indices of workers with a non-zero status or no report at all.
    pub fn failed_workers(&self) -> Vec<usize> {
        self.workers
            .iter()
            .enumerate()
            .filter(|(_, slot)| !matches!(slot, Some(report) if report.is_success()))
            .map(|(index, _)| index)
            .collect()
    }

    /// Returns `true` if every worker finished with status 0.
    pub fn all_workers_succeeded(&self) -> bool {
        self.failed_workers().is_empty()
    }
}

/// Drives one extraction run over a [`FrameSource`] and [`FrameSink`].
pub struct Coordinator<'a, S, W> {
    config: &'a ExtractionConfig,
    source: S,
    sink: W,
    detected_parallelism: Option<usize>,
}

impl<'a, S, W> Coordinator<'a, S, W>
where
    S: FrameSource,
    W: FrameSink,
{
    /// Create a coordinator. Nothing is opened until [`run`](Self::run).
    pub fn new(config: &'a ExtractionConfig, source: S, sink: W) -> Self {
        Self {
            config,
            source,
            sink,
            detected_parallelism: None,
        }
    }

    /// Use `parallelism` instead of the machine's detected parallelism when
    /// sizing the pool. The configured cap still applies.
    #[must_use]
    pub fn with_detected_parallelism(mut self, parallelism: usize) -> Self {
        self.detected_parallelism = Some(parallelism);
        self
    }

    fn worker_count(&self) -> usize {
        match self.detected_parallelism {
            Some(detected) => self
                .config
                .max_workers
                .map_or(detected, |cap| detected.min(cap)),
            None => partition::worker_count(self.config.max_workers),
        }
    }

    /// Probe the source and build the plan without dispatching any worker.
    ///
    /// # Errors
    ///
    /// - [`SplitError::InvalidStride`] for a zero stride.
    /// - [`SplitError::SourceUnavailable`] if the probe fails.
    /// - [`SplitError::NothingToDo`] for zero frames or zero workers.
    pub fn plan(&self) -> Result<(PartitionPlan, SourceInfo), SplitError> {
        self.config.validate()?;

        let info = self.source.probe()?;
        let plan = PartitionPlan::new(
            info.frame_count,
            self.worker_count(),
            self.config.sampling_stride,
        )?;

        log::info!(
            "{}: {} frames over {} workers: {} frames each, stride {}, {} samples expected",
            self.source.path().display(),
            plan.total_frames(),
            plan.worker_count(),
            plan.frames_per_worker(),
            plan.sampling_stride(),
            plan.expected_samples(),
        );
        if plan.dropped_frames() > 0 {
            log::info!(
                "Last {} frames fall outside every worker range and are skipped",
                plan.dropped_frames()
            );
        }

        Ok((plan, info))
    }

    /// Probe, partition, dispatch every worker and wait for all of them.
    ///
    /// Once workers are dispatched the run returns `Ok` whatever they report;
    /// inspect [`RunReport::failed_workers`] for per-worker failures.
    ///
    /// # Errors
    ///
    /// Errors from [`plan`](Self::plan), or [`SplitError::IoError`] if the
    /// output directory cannot be created. No worker is started in either
    /// case.
    pub fn run(&self) -> Result<RunReport, SplitError> {
        let (plan, source_info) = self.plan()?;
        self.run_planned(plan, source_info)
    }

    /// Dispatch workers for a plan already returned by [`plan`](Self::plan),
    /// without probing the source again.
    ///
    /// Lets a caller size a progress display from the plan and then run it.
    ///
    /// # Errors
    ///
    /// [`SplitError::IoError`] if the output directory cannot be created.
    pub fn run_planned(
        &self,
        plan: PartitionPlan,
        source_info: SourceInfo,
    ) -> Result<RunReport, SplitError> {
        if let Some(directory) = self.config.naming.output_directory() {
            fs::create_dir_all(&directory)?;
        }

        let counter = WorkerIndexCounter::new();
        let context = WorkerContext {
            plan,
            source: &self.source,
            sink: &self.sink,
            naming: &self.config.naming,
            output_size: self
                .config
                .frame_output
                .resolve(source_info.width, source_info.height),
            progress: &*self.config.progress,
            counter: &counter,
        };

        let mut workers: Vec<Option<WorkerReport>> =
            (0..plan.worker_count()).map(|_| None).collect();

        thread::scope(|scope| {
            let context = &context;
            let mut handles = Vec::with_capacity(plan.worker_count());

            for slot in 0..plan.worker_count() {
                let spawned = thread::Builder::new()
                    .name(format!("framesplit-worker-{slot}"))
                    .spawn_scoped(scope, move || run_worker(context));
                match spawned {
                    Ok(handle) => handles.push(handle),
                    Err(error) => {
                        log::error!("Could not spawn worker thread {slot}: {error}");
                        break;
                    }
                }
            }

            for handle in handles {
                match handle.join() {
                    Ok(Some(report)) => {
                        let index = report.worker_index();
                        workers[index] = Some(report);
                    }
                    Ok(None) => {}
                    Err(_) => log::error!("A worker thread panicked"),
                }
            }
        });

        let report = RunReport {
            source_path: self.source.path().to_path_buf(),
            plan,
            source_info,
            workers,
        };

        log::info!(
            "Run over {} finished: {} frames written, {} failed writes, {} failed workers",
            report.source_path.display(),
            report.frames_written(),
            report.write_failures(),
            report.failed_workers().len(),
        );

        Ok(report)
    }
}

/// Run `config` against its source file with the FFmpeg decoder and the
/// `image` encoder.
///
/// # Errors
///
/// See [`Coordinator::run`].
pub fn extract_frames(config: &ExtractionConfig) -> Result<RunReport, SplitError> {
    let source = FfmpegSource::new(config.source_path()).with_pixel_format(config.pixel_format);
    Coordinator::new(config, source, ImageFileSink).run()
}
