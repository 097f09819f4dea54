//! Whole-window nodata classification.
//!
//! Sentinel-1 scenes used here carry no reliable nodata mask, so the default
//! policy is a heuristic: a window whose minimum, maximum and mean are all
//! zero (or NaN) is treated as outside the swath. A window of genuine zeros
//! is indistinguishable from missing data under this rule.

use crate::window::WindowData;

/// Decides whether a freshly read window carries any usable data.
pub trait NodataPolicy: Send + Sync {
    fn is_all_nodata(&self, window: &WindowData) -> bool;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Default heuristic: min, max and mean each NaN or within `tolerance` of 0.
///
/// NaN samples are skipped when computing the summary, so one finite
/// non-zero sample is enough to keep the window.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ZeroOrNanHeuristic {
    pub tolerance: f64,
}

impl ZeroOrNanHeuristic {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    fn is_zero_or_nan(&self, value: Option<f64>) -> bool {
        match value {
            None => true,
            Some(v) => v.is_nan() || v.abs() <= self.tolerance,
        }
    }
}

impl NodataPolicy for ZeroOrNanHeuristic {
    fn is_all_nodata(&self, window: &WindowData) -> bool {
        if window.is_empty() {
            return true;
        }
        let summary = window.summary();
        self.is_zero_or_nan(summary.min)
            && self.is_zero_or_nan(summary.max)
            && self.is_zero_or_nan(summary.mean)
    }

    fn name(&self) -> &'static str {
        "zero-or-nan"
    }
}

/// Stricter policy for sources with a declared fill value: the window is
/// nodata only when every sample is NaN or equal to `fill`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FillValuePolicy {
    pub fill: f64,
}

impl NodataPolicy for FillValuePolicy {
    fn is_all_nodata(&self, window: &WindowData) -> bool {
        window
            .values()
            .iter()
            .all(|v| v.is_nan() || *v == self.fill)
    }

    fn name(&self) -> &'static str {
        "fill-value"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(values: Vec<f64>) -> WindowData {
        let width = values.len();
        WindowData::new(values, width, 1)
    }

    #[test]
    fn test_empty_window_is_nodata() {
        let policy = ZeroOrNanHeuristic::default();
        assert!(policy.is_all_nodata(&WindowData::new(vec![], 0, 0)));
    }

    #[test]
    fn test_all_zero_and_all_nan() {
        let policy = ZeroOrNanHeuristic::default();
        assert!(policy.is_all_nodata(&window(vec![0.0; 16])));
        assert!(policy.is_all_nodata(&window(vec![f64::NAN; 16])));
        assert!(policy.is_all_nodata(&window(vec![0.0, f64::NAN, -0.0, 0.0])));
    }

    #[test]
    fn test_single_value_keeps_window() {
        let policy = ZeroOrNanHeuristic::default();

        let mut values = vec![0.0; 100];
        values[57] = 0.25;
        assert!(!policy.is_all_nodata(&window(values)));

        let mut values = vec![f64::NAN; 100];
        values[3] = -1.5;
        assert!(!policy.is_all_nodata(&window(values)));
    }

    #[test]
    fn test_tolerance() {
        let policy = ZeroOrNanHeuristic::new(1e-6);
        assert!(policy.is_all_nodata(&window(vec![1e-9, -1e-9, 0.0])));
        assert!(!policy.is_all_nodata(&window(vec![1e-3, 0.0])));
    }

    #[test]
    fn test_fill_value_policy() {
        let policy = FillValuePolicy { fill: -9999.0 };
        assert!(policy.is_all_nodata(&window(vec![-9999.0, f64::NAN])));
        // Zeros are data for sources with a real fill value
        assert!(!policy.is_all_nodata(&window(vec![-9999.0, 0.0])));
    }
}
