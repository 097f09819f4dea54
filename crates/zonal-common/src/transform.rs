//! Affine transform between pixel and map coordinates.

use serde::{Deserialize, Serialize};

use crate::error::{CommonError, CommonResult};

/// Affine transform mapping pixel (col, row) to map (x, y).
///
/// Coefficients follow the rasterio/affine ordering:
///
/// ```text
/// x = a * col + b * row + c
/// y = d * col + e * row + f
/// ```
///
/// For a north-up raster `b == d == 0` and `e` is negative, so row indices
/// grow as y decreases.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl GeoTransform {
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// North-up transform from the upper-left corner and pixel size.
    ///
    /// `pixel_height` is the positive ground size of a row.
    pub fn north_up(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self::new(pixel_width, 0.0, origin_x, 0.0, -pixel_height, origin_y)
    }

    /// Map coordinate of a (fractional) pixel position.
    pub fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        (
            self.a * col + self.b * row + self.c,
            self.d * col + self.e * row + self.f,
        )
    }

    /// Map coordinate of the centre of pixel (col, row).
    pub fn pixel_center(&self, col: usize, row: usize) -> (f64, f64) {
        self.apply(col as f64 + 0.5, row as f64 + 0.5)
    }

    /// Fractional pixel position of a map coordinate.
    pub fn invert(&self, x: f64, y: f64) -> CommonResult<(f64, f64)> {
        let det = self.a * self.e - self.b * self.d;
        if det == 0.0 || !det.is_finite() {
            return Err(CommonError::SingularTransform(self.coefficients()));
        }

        let dx = x - self.c;
        let dy = y - self.f;
        let col = (self.e * dx - self.b * dy) / det;
        let row = (-self.d * dx + self.a * dy) / det;
        Ok((col, row))
    }

    /// Integer (row, col) of the pixel containing a map coordinate.
    pub fn rowcol(&self, x: f64, y: f64) -> CommonResult<(i64, i64)> {
        let (col, row) = self.invert(x, y)?;
        Ok((row.floor() as i64, col.floor() as i64))
    }

    /// Transform local to a window starting at (col_off, row_off).
    pub fn window_transform(&self, col_off: usize, row_off: usize) -> Self {
        let (c, f) = self.apply(col_off as f64, row_off as f64);
        Self { c, f, ..*self }
    }

    pub fn coefficients(&self) -> [f64; 6] {
        [self.a, self.b, self.c, self.d, self.e, self.f]
    }
}
