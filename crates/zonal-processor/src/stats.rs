//! Zone-masked statistics over a raster window.
//!
//! A pixel belongs to a zone when its centre lies inside the zone polygon
//! (centre-of-cell rule, boundary excluded). NaN samples never contribute.

use geo::{Contains, Point};
use raster_io::{pixel_window, WindowData};
use zonal_common::GeoTransform;

use crate::error::Result;
use crate::zones::ZoneDescriptor;

/// Reducer used for the variance column.
pub type VarianceFn = fn(&[f64]) -> f64;

/// Population variance (divide by N). Zero for fewer than two values.
pub fn population_variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}

/// Statistics of one zone on one band of one image.
///
/// Value fields are `None` when no pixel fell inside the zone.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ZoneStatistics {
    pub count: usize,
    pub mean: Option<f64>,
    pub range: Option<f64>,
    pub variance: Option<f64>,
}

/// Computes [`ZoneStatistics`] with a configurable variance reducer.
#[derive(Debug, Clone, Copy)]
pub struct StatisticCalculator {
    variance: VarianceFn,
}

impl Default for StatisticCalculator {
    fn default() -> Self {
        Self::new(population_variance)
    }
}

impl StatisticCalculator {
    pub fn new(variance: VarianceFn) -> Self {
        Self { variance }
    }

    /// Pixel values of `window` whose centres fall inside `zone`.
    ///
    /// `transform` is the window-local transform. Only the pixels under the
    /// zone's bounding box (plus a one-pixel margin for partially covered
    /// edge cells) are tested against the polygon.
    pub fn masked_values(
        &self,
        window: &WindowData,
        transform: &GeoTransform,
        zone: &ZoneDescriptor,
    ) -> Result<Vec<f64>> {
        if window.is_empty() {
            return Ok(Vec::new());
        }

        let candidates = pixel_window(transform, window.width(), window.height(), &zone.bounds())?;
        let col_start = candidates.col_off.saturating_sub(1);
        let row_start = candidates.row_off.saturating_sub(1);
        let col_end = (candidates.col_off + candidates.width + 1).min(window.width());
        let row_end = (candidates.row_off + candidates.height + 1).min(window.height());

        let bounds = zone.bounds();
        let mut values = Vec::new();
        for row in row_start..row_end {
            for col in col_start..col_end {
                let (x, y) = transform.pixel_center(col, row);
                if !bounds.contains_point(x, y) || !zone.geometry.contains(&Point::new(x, y)) {
                    continue;
                }
                if let Some(v) = window.get(row, col).filter(|v| !v.is_nan()) {
                    values.push(v);
                }
            }
        }
        Ok(values)
    }

    pub fn compute(
        &self,
        window: &WindowData,
        transform: &GeoTransform,
        zone: &ZoneDescriptor,
    ) -> Result<ZoneStatistics> {
        let values = self.masked_values(window, transform, zone)?;
        Ok(self.reduce(&values))
    }

    /// Summarise already-masked values.
    pub fn reduce(&self, values: &[f64]) -> ZoneStatistics {
        if values.is_empty() {
            return ZoneStatistics::default();
        }

        let (min, max, sum) = values.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY, 0.0),
            |(min, max, sum), &v| (min.min(v), max.max(v), sum + v),
        );

        ZoneStatistics {
            count: values.len(),
            mean: Some(sum / values.len() as f64),
            range: Some(max - min),
            variance: Some((self.variance)(values)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zones::{polygons_from_rings, Ring};
    use test_utils::assert_approx_eq;

    fn zone(ring: Vec<(f64, f64)>) -> ZoneDescriptor {
        ZoneDescriptor::new(1, 1, "g", "t", polygons_from_rings(1, vec![Ring::Outer(ring)]).unwrap())
            .unwrap()
    }

    fn rect(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Vec<(f64, f64)> {
        vec![
            (min_x, min_y),
            (min_x, max_y),
            (max_x, max_y),
            (max_x, min_y),
            (min_x, min_y),
        ]
    }

    // 4x4 window of 1 m pixels, upper-left at (0, 4); value = row * 4 + col
    fn window() -> (WindowData, GeoTransform) {
        let values = (0..16).map(|v| v as f64).collect();
        (WindowData::new(values, 4, 4), GeoTransform::north_up(0.0, 4.0, 1.0, 1.0))
    }

    #[test]
    fn test_population_variance() {
        assert_eq!(population_variance(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]), 4.0);
        assert_eq!(population_variance(&[3.0]), 0.0);
        assert_eq!(population_variance(&[]), 0.0);
    }

    #[test]
    fn test_centre_of_cell_rule() {
        let (data, transform) = window();
        // Covers the centres of columns 1-2 in rows 0-1 only
        let zone = zone(rect(0.8, 2.2, 3.2, 4.0));
        let calc = StatisticCalculator::default();
        let mut values = calc.masked_values(&data, &transform, &zone).unwrap();
        values.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(values, vec![1.0, 2.0, 5.0, 6.0]);
    }

    #[test]
    fn test_compute_statistics() {
        let (data, transform) = window();
        let zone = zone(rect(0.0, 0.0, 4.0, 4.0));
        let stats = StatisticCalculator::default()
            .compute(&data, &transform, &zone)
            .unwrap();
        assert_eq!(stats.count, 16);
        assert_eq!(stats.mean, Some(7.5));
        assert_eq!(stats.range, Some(15.0));
        assert_eq!(stats.variance, Some(21.25));
    }

    #[test]
    fn test_zone_outside_window() {
        let (data, transform) = window();
        let zone = zone(rect(100.0, 100.0, 110.0, 110.0));
        let stats = StatisticCalculator::default()
            .compute(&data, &transform, &zone)
            .unwrap();
        assert_eq!(stats, ZoneStatistics::default());
    }

    #[test]
    fn test_nan_pixels_excluded() {
        let mut values = vec![5.0; 16];
        values[0] = f64::NAN;
        let data = WindowData::new(values, 4, 4);
        let transform = GeoTransform::north_up(0.0, 4.0, 1.0, 1.0);
        let stats = StatisticCalculator::default()
            .compute(&data, &transform, &zone(rect(0.0, 0.0, 4.0, 4.0)))
            .unwrap();
        assert_eq!(stats.count, 15);
        assert_eq!(stats.mean, Some(5.0));
    }

    #[test]
    fn test_fractional_values() {
        let stats = StatisticCalculator::default().reduce(&[0.1, 0.2, 0.4]);
        assert_eq!(stats.count, 3);
        assert_approx_eq!(stats.mean.unwrap(), 0.7 / 3.0, 1e-12);
        assert_approx_eq!(stats.range.unwrap(), 0.3, 1e-12);
        assert_approx_eq!(stats.variance.unwrap(), 0.14 / 3.0 / 3.0, 1e-12);
    }

    #[test]
    fn test_custom_variance_reducer() {
        fn sample_variance(values: &[f64]) -> f64 {
            let n = values.len() as f64;
            population_variance(values) * n / (n - 1.0)
        }
        let stats = StatisticCalculator::new(sample_variance).reduce(&[1.0, 3.0]);
        assert_eq!(stats.variance, Some(2.0));
    }
}
