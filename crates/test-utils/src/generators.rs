//! Synthetic band generators.
//!
//! Values are predictable so tests can check exact statistics.

/// A band where each value is `col * 1000 + row`.
///
/// # Example
///
/// ```
/// use test_utils::ramp_band;
///
/// let band = ramp_band(10, 5);
/// assert_eq!(band.len(), 50);
/// assert_eq!(band[1], 1000.0);  // col=1, row=0
/// assert_eq!(band[10], 1.0);    // col=0, row=1
/// ```
pub fn ramp_band(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as f32);
        }
    }
    data
}

/// A band with every value set to `value`.
pub fn constant_band(width: usize, height: usize, value: f32) -> Vec<f32> {
    vec![value; width * height]
}

/// A band of zeros with `value` written into the given rectangle
/// (`col0..col1`, `row0..row1`), like a swath edge inside an empty scene.
pub fn patch_band(
    width: usize,
    height: usize,
    (col0, row0, col1, row1): (usize, usize, usize, usize),
    value: f32,
) -> Vec<f32> {
    let mut data = vec![0.0; width * height];
    for row in row0..row1.min(height) {
        for col in col0..col1.min(width) {
            data[row * width + col] = value;
        }
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_band() {
        let band = patch_band(4, 4, (1, 1, 3, 2), 7.0);
        assert_eq!(band.iter().filter(|v| **v == 7.0).count(), 2);
        assert_eq!(band[4 + 1], 7.0);
        assert_eq!(band[4 + 2], 7.0);
        assert_eq!(band[0], 0.0);
    }
}
