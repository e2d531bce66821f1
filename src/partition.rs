//! Static frame-range partitioning.
//!
//! A [`PartitionPlan`] splits `[0, total_frames)` into `worker_count`
//! contiguous, equally sized, half-open ranges. The division is an integer
//! division: the last `total_frames % worker_count` frames belong to no
//! worker and are never sampled.
//!
//! Inside its range a worker visits `start + stride`, `start + 2 * stride`,
//! and so on, strictly below the range end. The range start itself is never
//! emitted.
//!
//! # Example
//!
//! ```
//! use framesplit::PartitionPlan;
//!
//! let plan = PartitionPlan::new(300, 4, 30)?;
//! assert_eq!(plan.frames_per_worker(), 75);
//!
//! let second = plan.assignment(1).unwrap();
//! assert_eq!(second.range(), 75..150);
//! assert_eq!(second.sample_indices(30).collect::<Vec<_>>(), vec![105, 135]);
//! # Ok::<(), framesplit::SplitError>(())
//! ```

use std::{num::NonZeroUsize, ops::Range, thread};

use crate::error::SplitError;

/// Partitioning parameters shared read-only by every worker of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct PartitionPlan {
    total_frames: u64,
    worker_count: usize,
    frames_per_worker: u64,
    sampling_stride: u64,
}

impl PartitionPlan {
    /// Build a plan for `total_frames` frames over `worker_count` workers.
    ///
    /// # Errors
    ///
    /// - [`SplitError::NothingToDo`] if either count is zero.
    /// - [`SplitError::InvalidStride`] if `sampling_stride` is zero.
    pub fn new(
        total_frames: u64,
        worker_count: usize,
        sampling_stride: u64,
    ) -> Result<Self, SplitError> {
        if total_frames == 0 || worker_count == 0 {
            return Err(SplitError::NothingToDo {
                total_frames,
                worker_count,
            });
        }
        if sampling_stride == 0 {
            return Err(SplitError::InvalidStride);
        }

        Ok(Self {
            total_frames,
            worker_count,
            frames_per_worker: total_frames / worker_count as u64,
            sampling_stride,
        })
    }

    /// Total frame count reported by the probe.
    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    /// Number of workers in the pool.
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Length of every worker's range.
    pub fn frames_per_worker(&self) -> u64 {
        self.frames_per_worker
    }

    /// Distance between two consecutive sampled frames.
    pub fn sampling_stride(&self) -> u64 {
        self.sampling_stride
    }

    /// Number of frames covered by some worker's range.
    pub fn covered_frames(&self) -> u64 {
        self.frames_per_worker * self.worker_count as u64
    }

    /// Number of trailing frames no worker is responsible for.
    pub fn dropped_frames(&self) -> u64 {
        self.total_frames - self.covered_frames()
    }

    /// The assignment for `worker_index`, or `None` if the index is outside
    /// the pool.
    pub fn assignment(&self, worker_index: usize) -> Option<WorkerAssignment> {
        if worker_index >= self.worker_count {
            return None;
        }
        let index = worker_index as u64;
        Some(WorkerAssignment {
            worker_index,
            range_start: index * self.frames_per_worker,
            range_end: (index + 1) * self.frames_per_worker,
        })
    }

    /// All assignments in worker-index order.
    pub fn assignments(&self) -> impl Iterator<Item = WorkerAssignment> + '_ {
        (0..self.worker_count).filter_map(|index| self.assignment(index))
    }

    /// Number of frames the whole run will try to emit.
    pub fn expected_samples(&self) -> u64 {
        self.assignments()
            .map(|assignment| assignment.sample_count(self.sampling_stride))
            .sum()
    }
}

/// The half-open frame range owned by a single worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorkerAssignment {
    /// 0-based worker index.
    pub worker_index: usize,
    /// First frame of the range (never emitted itself).
    pub range_start: u64,
    /// One past the last frame of the range.
    pub range_end: u64,
}

impl WorkerAssignment {
    /// The range as a [`Range`].
    pub fn range(&self) -> Range<u64> {
        self.range_start..self.range_end
    }

    /// Returns `true` if `frame_number` lies inside this worker's range.
    pub fn contains(&self, frame_number: u64) -> bool {
        self.range().contains(&frame_number)
    }

    /// The global indices this worker samples: `start + k * stride` for
    /// `k = 1, 2, ...` while the index is below `range_end`.
    ///
    /// A zero stride yields nothing.
    pub fn sample_indices(&self, stride: u64) -> SampleIndices {
        SampleIndices {
            cursor: self.range_start,
            limit: self.range_end,
            stride,
        }
    }

    /// Number of indices [`sample_indices`](Self::sample_indices) yields.
    pub fn sample_count(&self, stride: u64) -> u64 {
        if stride == 0 || self.range_end <= self.range_start {
            return 0;
        }
        (self.range_end - self.range_start - 1) / stride
    }
}

/// Iterator over a worker's sampled frame indices.
#[derive(Debug, Clone)]
pub struct SampleIndices {
    cursor: u64,
    limit: u64,
    stride: u64,
}

impl Iterator for SampleIndices {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        if self.stride == 0 {
            return None;
        }
        let next = self.cursor.checked_add(self.stride)?;
        if next >= self.limit {
            return None;
        }
        self.cursor = next;
        Some(next)
    }
}

/// Worker count for this machine: the detected parallelism, capped by
/// `max_workers` when given.
///
/// Falls back to a single worker when parallelism cannot be detected. A cap
/// of zero yields zero, which the plan rejects as
/// [`SplitError::NothingToDo`].
pub fn worker_count(max_workers: Option<usize>) -> usize {
    let detected = thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1);
    match max_workers {
        Some(cap) => detected.min(cap),
        None => detected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_work() {
        assert!(matches!(
            PartitionPlan::new(0, 4, 1),
            Err(SplitError::NothingToDo { total_frames: 0, .. })
        ));
        assert!(matches!(
            PartitionPlan::new(100, 0, 1),
            Err(SplitError::NothingToDo { worker_count: 0, .. })
        ));
        assert!(matches!(
            PartitionPlan::new(100, 4, 0),
            Err(SplitError::InvalidStride)
        ));
    }

    #[test]
    fn truncates_remainder() {
        let plan = PartitionPlan::new(10, 3, 1).unwrap();
        assert_eq!(plan.frames_per_worker(), 3);
        assert_eq!(plan.covered_frames(), 9);
        assert_eq!(plan.dropped_frames(), 1);
        assert_eq!(plan.assignment(2).unwrap().range(), 6..9);
        assert!(plan.assignment(3).is_none());
    }

    #[test]
    fn stride_one_skips_range_start() {
        let assignment = PartitionPlan::new(12, 2, 1).unwrap().assignment(1).unwrap();
        let visited: Vec<u64> = assignment.sample_indices(1).collect();
        assert_eq!(visited, vec![7, 8, 9, 10, 11]);
        assert_eq!(assignment.sample_count(1), 5);
    }

    #[test]
    fn sample_count_matches_iterator() {
        for total in [1_u64, 7, 60, 299, 300, 1001] {
            for workers in 1..=9 {
                for stride in [1_u64, 2, 5, 30, 400] {
                    let plan = PartitionPlan::new(total, workers, stride).unwrap();
                    for assignment in plan.assignments() {
                        assert_eq!(
                            assignment.sample_indices(stride).count() as u64,
                            assignment.sample_count(stride),
                            "total={total} workers={workers} stride={stride}",
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn more_workers_than_frames_gives_empty_ranges() {
        let plan = PartitionPlan::new(3, 8, 1).unwrap();
        assert_eq!(plan.frames_per_worker(), 0);
        assert_eq!(plan.expected_samples(), 0);
        assert!(plan.assignments().all(|a| a.range().is_empty()));
    }

    #[test]
    fn worker_count_respects_cap() {
        assert_eq!(worker_count(Some(1)), 1);
        assert_eq!(worker_count(Some(0)), 0);
        assert!(worker_count(None) >= 1);
    }
}
