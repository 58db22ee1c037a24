//! Progress aggregation over sibling work units.
//!
//! Progress measures completion, not success: a set of children that all
//! failed is fully progressed.

use super::WorkUnitRef;

/// Children counted into pending, succeeded and failed buckets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressTally {
    /// Outcome not yet known.
    pub pending: usize,
    /// Finished successfully.
    pub succeeded: usize,
    /// Finished unsuccessfully.
    pub failed: usize,
}

impl ProgressTally {
    /// Creates an empty tally.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one outcome.
    pub fn record(&mut self, outcome: Option<bool>) {
        match outcome {
            Some(true) => self.succeeded += 1,
            Some(false) => self.failed += 1,
            None => self.pending += 1,
        }
    }

    /// Tallies a sequence of outcomes.
    #[must_use]
    pub fn from_outcomes(outcomes: impl IntoIterator<Item = Option<bool>>) -> Self {
        let mut tally = Self::new();
        for outcome in outcomes {
            tally.record(outcome);
        }
        tally
    }

    /// Tallies the outcomes of `units`.
    #[must_use]
    pub fn from_units(units: &[WorkUnitRef]) -> Self {
        Self::from_outcomes(units.iter().map(|u| u.success()))
    }

    /// Number of counted units.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.pending + self.succeeded + self.failed
    }

    /// `(succeeded + failed) / total`, or 0.0 for an empty tally.
    #[must_use]
    pub fn ratio(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => (self.succeeded + self.failed) as f64 / total as f64,
        }
    }
}

/// Computes the completion ratio of `units`.
#[must_use]
pub fn aggregate_progress(units: &[WorkUnitRef]) -> f64 {
    ProgressTally::from_units(units).ratio()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_tally_is_zero() {
        let tally = ProgressTally::new();
        assert_eq!(tally.total(), 0);
        assert_eq!(tally.ratio(), 0.0);
        assert_eq!(aggregate_progress(&[]), 0.0);
    }

    #[test]
    fn test_tally_buckets() {
        let tally = ProgressTally::from_outcomes([Some(true), None, Some(false), None]);
        assert_eq!(
            tally,
            ProgressTally {
                pending: 2,
                succeeded: 1,
                failed: 1,
            }
        );
        assert_eq!(tally.ratio(), 0.5);
    }

    #[test]
    fn test_all_failed_is_complete() {
        let tally = ProgressTally::from_outcomes([Some(false); 3]);
        assert_eq!(tally.ratio(), 1.0);
    }

    #[test]
    fn test_all_pending_is_zero() {
        let tally = ProgressTally::from_outcomes([None, None]);
        assert_eq!(tally.ratio(), 0.0);
    }
}
