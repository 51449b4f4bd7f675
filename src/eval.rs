//! Grid-search evaluation of blocking quality.
//!
//! For every `(rows_per_band, bucket_count)` cell the evaluator builds a fresh
//! [`LshIndex`] over the source entities, queries it with every target entity,
//! and scores the candidate pairs against the ground truth:
//!
//! | Metric | Formula |
//! |--------|---------|
//! | recall | tp / \|ground truth\| |
//! | precision | tp / verifications |
//! | f1 | 2·p·r / (p + r) |
//!
//! Every candidate counts as a verification; no pairwise similarity is computed.
//! Undefined ratios are reported as `0.0` and flagged on the record.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::entity::{DuplicatePair, EntityRecord, GroundTruth};
use crate::error::{Error, Result};
use crate::grid::{GridCell, GridSpec};
use crate::lsh::{Banding, LshIndex};
use crate::signature::GeneratorSpec;
use crate::tracker::PerformanceTracker;

/// Which metrics were undefined and degraded to `0.0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricFlags {
    /// Ground truth was empty, so recall is undefined.
    pub empty_ground_truth: bool,
    /// No candidate was returned, so precision is undefined.
    pub no_candidates: bool,
    /// precision + recall was zero, so F1 is undefined.
    pub zero_f1: bool,
}

impl MetricFlags {
    /// True if any metric was degraded.
    pub fn any(&self) -> bool {
        self.empty_ground_truth || self.no_candidates || self.zero_f1
    }
}

/// Blocking quality of one grid cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    /// 1-based position of the cell in enumeration order.
    pub iteration: usize,
    /// Rows per band.
    pub rows_per_band: usize,
    /// Buckets per band.
    pub bucket_count: usize,
    /// Candidate pairs present in the ground truth.
    pub true_positives: u64,
    /// Candidate pairs produced.
    pub verifications: u64,
    /// In `[0, 1]`.
    pub recall: f64,
    /// In `[0, 1]`.
    pub precision: f64,
    /// In `[0, 1]`.
    pub f1: f64,
    /// Degraded metrics.
    pub flags: MetricFlags,
}

impl PerformanceRecord {
    /// Derive metrics from raw counts.
    pub fn from_counts(
        cell: GridCell,
        true_positives: u64,
        verifications: u64,
        ground_truth_len: usize,
    ) -> Self {
        let mut flags = MetricFlags::default();

        let recall = if ground_truth_len == 0 {
            flags.empty_ground_truth = true;
            0.0
        } else {
            true_positives as f64 / ground_truth_len as f64
        };
        let precision = if verifications == 0 {
            flags.no_candidates = true;
            0.0
        } else {
            true_positives as f64 / verifications as f64
        };
        let f1 = if precision + recall == 0.0 {
            flags.zero_f1 = true;
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        };

        Self {
            iteration: cell.iteration,
            rows_per_band: cell.rows_per_band,
            bucket_count: cell.bucket_count,
            true_positives,
            verifications,
            recall,
            precision,
            f1,
            flags,
        }
    }

    /// The grid cell this record scores.
    pub fn cell(&self) -> GridCell {
        GridCell {
            iteration: self.iteration,
            rows_per_band: self.rows_per_band,
            bucket_count: self.bucket_count,
        }
    }
}

impl fmt::Display for PerformanceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "r: {} buckets: {} recall: {:.4} precision: {:.4} f1: {:.4}",
            self.rows_per_band, self.bucket_count, self.recall, self.precision, self.f1
        )
    }
}

/// Outcome of a sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepReport {
    /// Generator family used.
    pub generator: GeneratorSpec,
    /// One record per evaluated cell, ascending by iteration.
    pub records: Vec<PerformanceRecord>,
    /// Highest-F1 record, first-seen on ties.
    pub best: Option<PerformanceRecord>,
    /// True if the sweep stopped before every cell was evaluated.
    pub cancelled: bool,
}

/// Sweeps a [`GridSpec`] over fixed source/target collections.
#[derive(Debug, Clone)]
pub struct GridSearchEvaluator<'a> {
    source: &'a [EntityRecord],
    target: &'a [EntityRecord],
    ground_truth: &'a GroundTruth,
    generator: GeneratorSpec,
    grid: GridSpec,
    workers: usize,
}

impl<'a> GridSearchEvaluator<'a> {
    /// Create an evaluator; fails if the grid bounds are invalid.
    pub fn new(
        source: &'a [EntityRecord],
        target: &'a [EntityRecord],
        ground_truth: &'a GroundTruth,
        generator: GeneratorSpec,
        grid: GridSpec,
    ) -> Result<Self> {
        grid.validate()?;
        Ok(Self {
            source,
            target,
            ground_truth,
            generator,
            grid,
            workers: 1,
        })
    }

    /// Evaluate cells on `workers` threads (`<= 1` means sequential).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// The grid being swept.
    pub fn grid(&self) -> &GridSpec {
        &self.grid
    }

    /// Build, query and score a single cell.
    pub fn evaluate_cell(&self, cell: GridCell) -> Result<PerformanceRecord> {
        self.score_cell(cell).map_err(|e| e.in_cell(cell))
    }

    fn score_cell(&self, cell: GridCell) -> Result<PerformanceRecord> {
        let generator = self.generator.make()?;
        let banding = Banding::new(cell.rows_per_band, cell.bucket_count)?;
        if banding.num_bands(generator.signature_len()) == 0 {
            log::warn!(
                "{cell}: r exceeds signature length {}; no candidates possible",
                generator.signature_len()
            );
        }

        let index = LshIndex::build(generator, banding, self.source);
        log::debug!(
            "{cell}: indexed {} entities into {} bands, {} occupied buckets",
            index.len(),
            index.num_bands(),
            index.occupied_buckets()
        );

        let mut true_positives = 0u64;
        let mut verifications = 0u64;
        for (j, entity) in self.target.iter().enumerate() {
            for c in index.query(entity) {
                verifications += 1;
                if self.ground_truth.contains(&DuplicatePair::new(c, j)) {
                    true_positives += 1;
                }
            }
        }

        Ok(PerformanceRecord::from_counts(
            cell,
            true_positives,
            verifications,
            self.ground_truth.len(),
        ))
    }

    /// Evaluate every cell.
    pub fn sweep(&self) -> Result<SweepReport> {
        self.sweep_until(&AtomicBool::new(false))
    }

    /// Evaluate cells until `cancel` is set; the flag is checked before each cell.
    pub fn sweep_until(&self, cancel: &AtomicBool) -> Result<SweepReport> {
        self.sweep_until_with(cancel, |_| {})
    }

    /// Like [`Self::sweep_until`], calling `on_record` after each evaluated cell.
    ///
    /// With more than one worker `on_record` runs on pool threads, in completion
    /// order. Setting `cancel` from inside it stops the sweep before the next cell.
    pub fn sweep_until_with<F>(&self, cancel: &AtomicBool, on_record: F) -> Result<SweepReport>
    where
        F: Fn(&PerformanceRecord) + Sync,
    {
        log::info!(
            "grid search starts: {} cells, {} source / {} target entities, {} duplicates, {} worker(s)",
            self.grid.len(),
            self.source.len(),
            self.target.len(),
            self.ground_truth.len(),
            self.workers
        );
        let (records, best, cancelled) = if self.workers > 1 {
            self.sweep_parallel(cancel, &on_record)?
        } else {
            self.sweep_sequential(cancel, &on_record)?
        };
        if cancelled {
            log::info!(
                "grid search cancelled after {} of {} cells",
                records.len(),
                self.grid.len()
            );
        }
        if let Some(best) = &best {
            log::info!("best: {best}");
        }
        Ok(SweepReport {
            generator: self.generator,
            records,
            best,
            cancelled,
        })
    }

    fn sweep_sequential(
        &self,
        cancel: &AtomicBool,
        on_record: &(dyn Fn(&PerformanceRecord) + Sync),
    ) -> Result<(Vec<PerformanceRecord>, Option<PerformanceRecord>, bool)> {
        let mut tracker = PerformanceTracker::new();
        let mut records = Vec::new();
        for cell in self.grid.cells() {
            if cancel.load(Ordering::Relaxed) {
                return Ok((records, tracker.into_best(), true));
            }
            let record = self.evaluate_cell(cell)?;
            log::info!("{}", progress_line(&record));
            tracker.consider(&record);
            on_record(&record);
            records.push(record);
        }
        Ok((records, tracker.into_best(), false))
    }

    fn sweep_parallel(
        &self,
        cancel: &AtomicBool,
        on_record: &(dyn Fn(&PerformanceRecord) + Sync),
    ) -> Result<(Vec<PerformanceRecord>, Option<PerformanceRecord>, bool)> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()
            .map_err(|e| Error::config(format!("failed to start worker pool: {e}")))?;

        // Records and the tracker are updated under one lock so `best` is
        // always one of the returned records.
        let done = Mutex::new((PerformanceTracker::new(), Vec::new()));
        let failure: Mutex<Option<(usize, Error)>> = Mutex::new(None);
        let grid = self.grid;

        let outcome = pool.install(|| {
            (0..grid.len()).into_par_iter().try_for_each(|index| {
                if cancel.load(Ordering::Relaxed) {
                    return Err(());
                }
                let Some(cell) = grid.cell_at(index) else {
                    return Ok(());
                };
                let record = match self.evaluate_cell(cell) {
                    Ok(record) => record,
                    Err(e) => {
                        let mut slot = failure.lock().unwrap_or_else(PoisonError::into_inner);
                        // Report the earliest failing cell, as the sequential sweep would.
                        if slot.as_ref().map_or(true, |(first, _)| index < *first) {
                            *slot = Some((index, e));
                        }
                        return Err(());
                    }
                };
                log::info!("{}", progress_line(&record));
                {
                    let mut guard = done.lock().unwrap_or_else(PoisonError::into_inner);
                    guard.0.consider(&record);
                    guard.1.push(record.clone());
                }
                on_record(&record);
                Ok(())
            })
        });

        if let Some((_, e)) = failure.into_inner().unwrap_or_else(PoisonError::into_inner) {
            return Err(e);
        }
        let (tracker, mut records) = done.into_inner().unwrap_or_else(PoisonError::into_inner);
        records.sort_by_key(|r| r.iteration);
        Ok((records, tracker.into_best(), outcome.is_err()))
    }
}

/// Per-cell progress line, identical for sequential and parallel sweeps.
fn progress_line(record: &PerformanceRecord) -> String {
    format!("Iteration: {} {record}", record.iteration)
}
