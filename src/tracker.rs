//! Best-configuration tracking.

use crate::eval::PerformanceRecord;

/// Keeps the record with the highest F1 seen so far.
///
/// Ties go to the record with the lower iteration index, so the outcome does not
/// depend on the order in which (possibly parallel) cells report.
#[derive(Debug, Clone, Default)]
pub struct PerformanceTracker {
    best: Option<PerformanceRecord>,
    considered: usize,
}

impl PerformanceTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer a record; returns `true` if it became the new best.
    pub fn consider(&mut self, record: &PerformanceRecord) -> bool {
        self.considered += 1;
        let replace = match &self.best {
            None => true,
            Some(best) => {
                record.f1 > best.f1 || (record.f1 == best.f1 && record.iteration < best.iteration)
            }
        };
        if replace {
            self.best = Some(record.clone());
        }
        replace
    }

    /// The best record, or `None` if nothing was considered.
    pub fn summary(&self) -> Option<&PerformanceRecord> {
        self.best.as_ref()
    }

    /// Consume the tracker, returning the best record.
    pub fn into_best(self) -> Option<PerformanceRecord> {
        self.best
    }

    /// Number of records offered.
    pub fn considered(&self) -> usize {
        self.considered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::MetricFlags;

    fn rec(iteration: usize, f1: f64) -> PerformanceRecord {
        PerformanceRecord {
            iteration,
            rows_per_band: 1,
            bucket_count: iteration,
            true_positives: 0,
            verifications: 0,
            recall: f1,
            precision: f1,
            f1,
            flags: MetricFlags::default(),
        }
    }

    #[test]
    fn empty_tracker_has_no_summary() {
        let t = PerformanceTracker::new();
        assert!(t.summary().is_none());
        assert_eq!(t.considered(), 0);
    }

    #[test]
    fn keeps_strictly_better() {
        let mut t = PerformanceTracker::new();
        assert!(t.consider(&rec(1, 0.2)));
        assert!(t.consider(&rec(2, 0.5)));
        assert!(!t.consider(&rec(3, 0.4)));
        assert_eq!(t.summary().unwrap().iteration, 2);
        assert_eq!(t.considered(), 3);
    }

    #[test]
    fn ties_keep_first_seen() {
        let mut t = PerformanceTracker::new();
        t.consider(&rec(1, 0.5));
        assert!(!t.consider(&rec(2, 0.5)));
        assert_eq!(t.summary().unwrap().iteration, 1);
    }

    #[test]
    fn ties_resolve_by_iteration_regardless_of_arrival() {
        let mut t = PerformanceTracker::new();
        t.consider(&rec(4, 0.5));
        t.consider(&rec(2, 0.5));
        t.consider(&rec(3, 0.5));
        assert_eq!(t.into_best().unwrap().iteration, 2);
    }

    #[test]
    fn first_record_wins_even_at_zero() {
        let mut t = PerformanceTracker::new();
        t.consider(&rec(1, 0.0));
        t.consider(&rec(2, 0.0));
        assert_eq!(t.summary().unwrap().iteration, 1);
    }
}
