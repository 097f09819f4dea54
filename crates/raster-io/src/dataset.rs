//! Raster dataset abstraction.

use std::path::Path;

use zonal_common::GeoTransform;

use crate::error::{RasterError, Result};

/// A rectangular block of pixels, `col_off`/`row_off` from the upper-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PixelWindow {
    pub col_off: usize,
    pub row_off: usize,
    pub width: usize,
    pub height: usize,
}

impl PixelWindow {
    pub fn new(col_off: usize, row_off: usize, width: usize, height: usize) -> Self {
        Self {
            col_off,
            row_off,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn len(&self) -> usize {
        self.width * self.height
    }
}

/// An open raster.
///
/// Implementations only decode what `read_window` asks for.
pub trait RasterDataset {
    /// Raster width in pixels.
    fn width(&self) -> usize;

    /// Raster height in pixels.
    fn height(&self) -> usize;

    /// Number of bands.
    fn band_count(&self) -> usize;

    /// Transform of the full raster.
    fn transform(&self) -> GeoTransform;

    /// Read one band (1-based) within `window`, row-major, top row first.
    ///
    /// The window must lie within the raster.
    fn read_window(&mut self, band: usize, window: &PixelWindow) -> Result<Vec<f64>>;

    /// Check that a 1-based band index exists.
    fn check_band(&self, band: usize) -> Result<()> {
        if band == 0 || band > self.band_count() {
            return Err(RasterError::BandOutOfRange {
                band,
                count: self.band_count(),
            });
        }
        Ok(())
    }
}

/// Opens rasters by path.
///
/// Shared across worker threads; every call yields an independent handle
/// that is dropped once the read is done.
pub trait RasterOpener: Send + Sync {
    fn open(&self, path: &Path) -> Result<Box<dyn RasterDataset>>;
}
