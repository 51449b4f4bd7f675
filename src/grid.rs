//! Hyperparameter grid: inclusive ranges and lazy cell enumeration.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Inclusive integer range `min..=max` walked with a positive `step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamRange {
    /// First value.
    pub min: usize,
    /// Last value (inclusive; reached only if on the step lattice).
    pub max: usize,
    /// Increment, >= 1.
    pub step: usize,
}

impl ParamRange {
    /// Create a range; see [`Self::validate`].
    pub fn new(min: usize, max: usize, step: usize) -> Self {
        Self { min, max, step }
    }

    /// A range holding one value.
    pub fn single(value: usize) -> Self {
        Self::new(value, value, 1)
    }

    /// Check `1 <= min <= max` and `step >= 1`. `name` labels the error.
    pub fn validate(&self, name: &str) -> Result<()> {
        if self.step == 0 {
            return Err(Error::config(format!("{name}: step must be >= 1")));
        }
        if self.min == 0 {
            return Err(Error::config(format!("{name}: min must be >= 1")));
        }
        if self.max < self.min {
            return Err(Error::config(format!(
                "{name}: max ({}) < min ({})",
                self.max, self.min
            )));
        }
        Ok(())
    }

    /// Values in ascending order.
    pub fn values(&self) -> impl Iterator<Item = usize> + Clone {
        let (max, step) = (self.max, self.step.max(1));
        std::iter::successors(Some(self.min), move |&v| v.checked_add(step))
            .take_while(move |&v| v <= max)
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        if self.step == 0 || self.max < self.min {
            return 0;
        }
        ((self.max - self.min) / self.step).saturating_add(1)
    }

    /// The `k`-th value (`min + k * step`), or `None` past `max`.
    pub fn nth(&self, k: usize) -> Option<usize> {
        let v = k.checked_mul(self.step)?.checked_add(self.min)?;
        (self.step > 0 && v <= self.max).then_some(v)
    }

    /// True if the range holds no values.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One point of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridCell {
    /// 1-based position in enumeration order.
    pub iteration: usize,
    /// Rows per band.
    pub rows_per_band: usize,
    /// Buckets per band.
    pub bucket_count: usize,
}

impl fmt::Display for GridCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "iteration {} (r={}, buckets={})",
            self.iteration, self.rows_per_band, self.bucket_count
        )
    }
}

/// The Cartesian grid of `(rows_per_band, bucket_count)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSpec {
    /// Rows-per-band range (outer loop).
    pub rows_per_band: ParamRange,
    /// Bucket-count range (inner loop).
    pub bucket_count: ParamRange,
}

impl GridSpec {
    /// Create a grid.
    pub fn new(rows_per_band: ParamRange, bucket_count: ParamRange) -> Self {
        Self {
            rows_per_band,
            bucket_count,
        }
    }

    /// Validate both ranges and that the cell count fits in `usize`.
    pub fn validate(&self) -> Result<()> {
        self.rows_per_band.validate("rows_per_band")?;
        self.bucket_count.validate("bucket_count")?;
        if self.checked_len().is_none() {
            return Err(Error::config(format!(
                "grid has too many cells ({} x {})",
                self.rows_per_band.len(),
                self.bucket_count.len()
            )));
        }
        Ok(())
    }

    /// Total number of cells, or `None` if it overflows `usize`.
    pub fn checked_len(&self) -> Option<usize> {
        self.rows_per_band.len().checked_mul(self.bucket_count.len())
    }

    /// Total number of cells (saturating).
    pub fn len(&self) -> usize {
        self.checked_len().unwrap_or(usize::MAX)
    }

    /// True if the grid has no cells.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cells in enumeration order: `r` ascending, then `bucket_count` ascending.
    ///
    /// The iterator is lazy; call again (or clone it) to restart.
    pub fn cells(&self) -> GridCells {
        GridCells {
            spec: *self,
            next: 0,
            total: self.len(),
        }
    }

    /// The cell at zero-based position `index` in enumeration order.
    pub fn cell_at(&self, index: usize) -> Option<GridCell> {
        let per_row = self.bucket_count.len();
        if per_row == 0 {
            return None;
        }
        Some(GridCell {
            iteration: index.checked_add(1)?,
            rows_per_band: self.rows_per_band.nth(index / per_row)?,
            bucket_count: self.bucket_count.nth(index % per_row)?,
        })
    }
}

/// Iterator over [`GridCell`]s, see [`GridSpec::cells`].
#[derive(Debug, Clone)]
pub struct GridCells {
    spec: GridSpec,
    next: usize,
    total: usize,
}

impl GridCells {
    /// Grid being walked.
    pub fn spec(&self) -> &GridSpec {
        &self.spec
    }
}

impl Iterator for GridCells {
    type Item = GridCell;

    fn next(&mut self) -> Option<GridCell> {
        if self.next >= self.total {
            return None;
        }
        let cell = self.spec.cell_at(self.next)?;
        self.next += 1;
        Some(cell)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.total - self.next;
        (n, Some(n))
    }
}

impl ExactSizeIterator for GridCells {}
