//! Frame-range extraction workers.
//!
//! A worker takes the next index from the shared [`WorkerIndexCounter`],
//! derives its range from the [`PartitionPlan`], opens its own cursor and
//! walks the range at the sampling stride. Each step is an absolute seek to
//! `start + k * stride`. The walk stops at the range end, on a rejected seek,
//! or when a read yields no frame. A failed write is logged and skipped.
//!
//! Workers never wait on each other. The counter increment is the only
//! shared mutation in a run.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    sync::atomic::{AtomicUsize, Ordering},
};

use image::{DynamicImage, imageops::FilterType};

use crate::{
    error::SplitError,
    naming::OutputNaming,
    partition::{PartitionPlan, WorkerAssignment},
    progress::{FrameProgress, ProgressCallback},
    source::{DecodeCursor, FrameSink, FrameSource},
};

/// Hands out unique, increasing worker indices.
#[derive(Debug, Default)]
pub struct WorkerIndexCounter {
    next: AtomicUsize,
}

impl WorkerIndexCounter {
    /// A counter whose first index is 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the next index. Every call returns a distinct value.
    pub fn next_index(&self) -> usize {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

/// Read-only state shared by every worker of a run.
pub struct WorkerContext<'a, S, W> {
    /// Partitioning parameters.
    pub plan: PartitionPlan,
    /// Video every worker opens its own cursor on.
    pub source: &'a S,
    /// Destination for encoded frames.
    pub sink: &'a W,
    /// Output filename scheme.
    pub naming: &'a OutputNaming,
    /// Fixed output resolution, if any.
    pub output_size: Option<(u32, u32)>,
    /// Progress observer.
    pub progress: &'a dyn ProgressCallback,
    /// Source of worker indices.
    pub counter: &'a WorkerIndexCounter,
}

/// Why a worker's sampling loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The next sample index reached the range end.
    RangeExhausted,
    /// A read at `frame_number` produced no usable frame.
    DecodeEmpty {
        /// Position of the empty read.
        frame_number: u64,
    },
    /// The cursor could not be opened.
    OpenFailed,
    /// The cursor rejected a seek to `frame_number`.
    SeekFailed {
        /// Seek target.
        frame_number: u64,
    },
}

impl Display for StopReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StopReason::RangeExhausted => write!(f, "range exhausted"),
            StopReason::DecodeEmpty { frame_number } => {
                write!(f, "no frame at {frame_number}")
            }
            StopReason::OpenFailed => write!(f, "source open failed"),
            StopReason::SeekFailed { frame_number } => write!(f, "seek to {frame_number} failed"),
        }
    }
}

/// Outcome of one worker.
#[derive(Debug)]
pub struct WorkerReport {
    /// The range this worker owned.
    pub assignment: WorkerAssignment,
    /// Frames successfully written.
    pub frames_written: u64,
    /// Frames decoded but not written.
    pub write_failures: u64,
    /// Why the loop ended.
    pub stop: StopReason,
    /// The error behind a non-zero status.
    pub error: Option<SplitError>,
}

impl WorkerReport {
    fn new(assignment: WorkerAssignment) -> Self {
        Self {
            assignment,
            frames_written: 0,
            write_failures: 0,
            stop: StopReason::RangeExhausted,
            error: None,
        }
    }

    /// Index of the worker.
    pub fn worker_index(&self) -> usize {
        self.assignment.worker_index
    }

    /// 0 on success, 1 if the cursor could not be opened or a seek failed.
    pub fn status(&self) -> i32 {
        match self.stop {
            StopReason::OpenFailed | StopReason::SeekFailed { .. } => 1,
            StopReason::RangeExhausted | StopReason::DecodeEmpty { .. } => 0,
        }
    }

    /// Returns `true` if [`status`](Self::status) is 0.
    pub fn is_success(&self) -> bool {
        self.status() == 0
    }
}

/// Run one worker to completion on the calling thread.
///
/// Returns `None` only if the counter hands out an index outside the pool,
/// which happens when more workers are started than the plan has slots.
pub fn run_worker<S, W>(context: &WorkerContext<'_, S, W>) -> Option<WorkerReport>
where
    S: FrameSource,
    W: FrameSink,
{
    let worker_index = context.counter.next_index();
    let Some(assignment) = context.plan.assignment(worker_index) else {
        log::error!(
            "Worker index {worker_index} is outside a pool of {}",
            context.plan.worker_count()
        );
        return None;
    };

    log::debug!(
        "Worker {worker_index} owns frames [{}, {})",
        assignment.range_start,
        assignment.range_end,
    );

    let mut report = WorkerReport::new(assignment);

    let mut cursor = match open_cursor(context) {
        Ok(cursor) => cursor,
        Err(error) => {
            log::error!(
                "Worker {worker_index} could not open {}: {error}",
                context.source.path().display()
            );
            report.stop = StopReason::OpenFailed;
            report.error = Some(error);
            return Some(report);
        }
    };

    for frame_number in assignment.sample_indices(context.plan.sampling_stride()) {
        if let Err(error) = cursor.seek(frame_number) {
            log::error!("Worker {worker_index}: {error}");
            report.stop = StopReason::SeekFailed { frame_number };
            report.error = Some(error);
            break;
        }

        let image = match cursor.read_frame() {
            Ok(Some(image)) if image.width() > 0 && image.height() > 0 => image,
            Ok(_) => {
                log::debug!("Worker {worker_index}: no frame at {frame_number}, stopping");
                report.stop = StopReason::DecodeEmpty { frame_number };
                break;
            }
            Err(error) => {
                log::warn!("Worker {worker_index}: decode failed at {frame_number}: {error}");
                report.stop = StopReason::DecodeEmpty { frame_number };
                break;
            }
        };

        let image = apply_transform(image, context.output_size);
        let path = context.naming.path_for(frame_number);

        match context.sink.write(&image, &path) {
            Ok(()) => {
                report.frames_written += 1;
                context.progress.on_frame(&FrameProgress {
                    worker_index,
                    frame_number,
                    path: &path,
                });
            }
            Err(error) => {
                log::warn!("Worker {worker_index}: {error}");
                report.write_failures += 1;
            }
        }
    }

    log::info!(
        "Worker {worker_index} done: {} written, {} failed writes, {}",
        report.frames_written,
        report.write_failures,
        report.stop,
    );

    Some(report)
}

fn open_cursor<S, W>(context: &WorkerContext<'_, S, W>) -> Result<S::Cursor, SplitError>
where
    S: FrameSource,
{
    let mut cursor = context.source.open_cursor()?;
    if let Some((width, height)) = context.output_size {
        cursor.set_output_size(width, height)?;
    }
    Ok(cursor)
}

/// Resize to the fixed output size with a cubic filter. Frames already at
/// that size, or runs without a fixed size, pass through untouched.
pub fn apply_transform(image: DynamicImage, output_size: Option<(u32, u32)>) -> DynamicImage {
    match output_size {
        Some((width, height)) if (image.width(), image.height()) != (width, height) => {
            image.resize_exact(width, height, FilterType::CatmullRom)
        }
        _ => image,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use image::RgbImage;

    use super::*;

    #[test]
    fn counter_hands_out_unique_indices() {
        let counter = WorkerIndexCounter::new();
        let indices: HashSet<usize> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..16)
                .map(|_| scope.spawn(|| counter.next_index()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert_eq!(indices, (0..16).collect());
    }

    #[test]
    fn transform_resizes_only_when_needed() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(32, 18));
        let resized = apply_transform(image.clone(), Some((16, 9)));
        assert_eq!((resized.width(), resized.height()), (16, 9));

        let untouched = apply_transform(image, None);
        assert_eq!((untouched.width(), untouched.height()), (32, 18));
    }

    #[test]
    fn status_codes() {
        let assignment = PartitionPlan::new(10, 1, 1).unwrap().assignment(0).unwrap();
        let mut report = WorkerReport::new(assignment);
        assert_eq!(report.status(), 0);
        report.stop = StopReason::DecodeEmpty { frame_number: 3 };
        assert!(report.is_success());
        report.stop = StopReason::SeekFailed { frame_number: 3 };
        assert_eq!(report.status(), 1);
    }
}
