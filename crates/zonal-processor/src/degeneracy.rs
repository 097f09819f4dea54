//! Rules for discarding statistics that carry no information.

use crate::stats::ZoneStatistics;

/// Decides whether a zone's statistics are kept in the partition table.
pub trait DegeneracyPolicy: Send + Sync {
    fn is_degenerate(&self, stats: &ZoneStatistics) -> bool;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Discards empty intersections and results where mean, range and
/// variance are all exactly zero (a zone lying in a zero-filled region).
///
/// A constant non-zero zone has range and variance 0 but is kept.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyOrAllZero;

impl DegeneracyPolicy for EmptyOrAllZero {
    fn is_degenerate(&self, stats: &ZoneStatistics) -> bool {
        match (stats.mean, stats.range, stats.variance) {
            _ if stats.count == 0 => true,
            (Some(mean), Some(range), Some(variance)) => {
                mean == 0.0 && range == 0.0 && variance == 0.0
            }
            _ => true,
        }
    }

    fn name(&self) -> &'static str {
        "empty-or-all-zero"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(count: usize, mean: f64, range: f64, variance: f64) -> ZoneStatistics {
        ZoneStatistics {
            count,
            mean: Some(mean),
            range: Some(range),
            variance: Some(variance),
        }
    }

    #[test]
    fn test_empty_is_degenerate() {
        assert!(EmptyOrAllZero.is_degenerate(&ZoneStatistics::default()));
    }

    #[test]
    fn test_all_zero_is_degenerate() {
        assert!(EmptyOrAllZero.is_degenerate(&stats(12, 0.0, 0.0, 0.0)));
    }

    #[test]
    fn test_constant_non_zero_is_kept() {
        assert!(!EmptyOrAllZero.is_degenerate(&stats(100, 5.0, 0.0, 0.0)));
        // Zero mean alone is not enough
        assert!(!EmptyOrAllZero.is_degenerate(&stats(2, 0.0, 2.0, 1.0)));
    }
}
