//! In-memory rasters.
//!
//! Used for synthetic scenes and tests; behaves like a file-backed raster
//! including "not found" for unknown paths.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use zonal_common::GeoTransform;

use crate::dataset::{PixelWindow, RasterDataset, RasterOpener};
use crate::error::{RasterError, Result};

/// A raster held entirely in memory, one row-major buffer per band.
#[derive(Debug, Clone)]
pub struct MemoryRaster {
    width: usize,
    height: usize,
    transform: GeoTransform,
    bands: Vec<Vec<f64>>,
}

impl MemoryRaster {
    /// Create a raster; every band buffer must hold `width * height` values.
    pub fn new(
        width: usize,
        height: usize,
        transform: GeoTransform,
        bands: Vec<Vec<f64>>,
    ) -> Result<Self> {
        if let Some((i, band)) = bands
            .iter()
            .enumerate()
            .find(|(_, b)| b.len() != width * height)
        {
            return Err(RasterError::read_failed(format!(
                "band {} has {} values, expected {}",
                i + 1,
                band.len(),
                width * height
            )));
        }

        Ok(Self {
            width,
            height,
            transform,
            bands,
        })
    }

    /// Raster with every band filled with `value`.
    pub fn filled(
        width: usize,
        height: usize,
        transform: GeoTransform,
        band_count: usize,
        value: f64,
    ) -> Self {
        Self {
            width,
            height,
            transform,
            bands: vec![vec![value; width * height]; band_count],
        }
    }
}

impl RasterDataset for MemoryRaster {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn band_count(&self) -> usize {
        self.bands.len()
    }

    fn transform(&self) -> GeoTransform {
        self.transform
    }

    fn read_window(&mut self, band: usize, window: &PixelWindow) -> Result<Vec<f64>> {
        self.check_band(band)?;
        if window.col_off + window.width > self.width || window.row_off + window.height > self.height {
            return Err(RasterError::read_failed(format!(
                "window {:?} exceeds raster {}x{}",
                window, self.width, self.height
            )));
        }

        let data = &self.bands[band - 1];
        let mut out = Vec::with_capacity(window.len());
        for row in window.row_off..window.row_off + window.height {
            let start = row * self.width + window.col_off;
            out.extend_from_slice(&data[start..start + window.width]);
        }
        Ok(out)
    }
}

/// Path-keyed collection of in-memory rasters.
#[derive(Debug, Clone, Default)]
pub struct MemoryRasterStore {
    rasters: HashMap<PathBuf, MemoryRaster>,
}

impl MemoryRasterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, raster: MemoryRaster) {
        self.rasters.insert(path.into(), raster);
    }

    pub fn len(&self) -> usize {
        self.rasters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rasters.is_empty()
    }
}

impl RasterOpener for MemoryRasterStore {
    fn open(&self, path: &Path) -> Result<Box<dyn RasterDataset>> {
        let raster = self
            .rasters
            .get(path)
            .ok_or_else(|| RasterError::NotFound(path.to_path_buf()))?;
        Ok(Box::new(raster.clone()))
    }
}
