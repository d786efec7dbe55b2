//! Completion statistics.

use serde::{Deserialize, Serialize};

/// `(completed, total)` pair for one plan rank or for all tasks.
///
/// Every record counts as one unit of total and, when its completion flag is
/// set, one unit of completed. There is no weighting or partial credit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub completed: u64,
    pub total: u64,
}

impl Stats {
    #[must_use]
    pub const fn new(completed: u64, total: u64) -> Self {
        Self { completed, total }
    }

    /// Completed / total, or 0.0 when there is nothing to count.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }

    /// Ratio as a rounded percentage.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn percent(&self) -> u8 {
        (self.ratio() * 100.0).round().clamp(0.0, 100.0) as u8
    }

    /// Records not yet completed.
    #[must_use]
    pub const fn remaining(&self) -> u64 {
        self.total.saturating_sub(self.completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_ratio_is_zero() {
        let stats = Stats::default();
        assert_eq!(stats, Stats::new(0, 0));
        assert!(stats.ratio().abs() < f64::EPSILON);
        assert_eq!(stats.percent(), 0);
    }

    #[test]
    fn test_ratio() {
        let stats = Stats::new(1, 4);
        assert!((stats.ratio() - 0.25).abs() < f64::EPSILON);
        assert_eq!(stats.percent(), 25);
        assert_eq!(stats.remaining(), 3);
        assert_eq!(Stats::new(2, 3).percent(), 67);
    }
}
