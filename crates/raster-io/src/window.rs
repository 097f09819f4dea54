//! Geographic window extraction.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;
use zonal_common::{BoundingBox, GeoTransform};

use crate::dataset::{PixelWindow, RasterOpener};
use crate::error::Result;
use crate::nodata::{NodataPolicy, ZeroOrNanHeuristic};

/// Pixel values of one band within a window (row-major, top row first).
#[derive(Debug, Clone, PartialEq)]
pub struct WindowData {
    values: Vec<f64>,
    width: usize,
    height: usize,
}

/// NaN-skipping min/max/mean of a window. `None` when no finite sample exists.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WindowSummary {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
}

impl WindowData {
    pub fn new(values: Vec<f64>, width: usize, height: usize) -> Self {
        debug_assert_eq!(values.len(), width * height);
        Self {
            values,
            width,
            height,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.height || col >= self.width {
            return None;
        }
        self.values.get(row * self.width + col).copied()
    }

    pub fn summary(&self) -> WindowSummary {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        let mut count = 0usize;

        for &v in self.values.iter().filter(|v| !v.is_nan()) {
            min = min.min(v);
            max = max.max(v);
            sum += v;
            count += 1;
        }

        if count == 0 {
            return WindowSummary::default();
        }
        WindowSummary {
            min: Some(min),
            max: Some(max),
            mean: Some(sum / count as f64),
        }
    }
}

/// Result of a windowed read: the data, its own transform, and the
/// nodata verdict.
#[derive(Debug, Clone)]
pub struct AoiWindow {
    pub data: WindowData,
    /// Transform local to the window (origin at the window's upper-left).
    pub transform: GeoTransform,
    /// Where the window sits in the full raster.
    pub window: PixelWindow,
    pub all_nodata: bool,
}

/// Map a bounding box onto the raster grid and clip it to the raster.
///
/// Rows run opposite to y: the box's top edge (`max_y`) gives the first row
/// and its bottom edge (`min_y`) the end row. End indices are exclusive, so
/// a pixel only partially covered at the right/bottom edge is left out.
pub fn pixel_window(
    transform: &GeoTransform,
    raster_width: usize,
    raster_height: usize,
    bbox: &BoundingBox,
) -> Result<PixelWindow> {
    let corners = [
        (bbox.min_x, bbox.max_y),
        (bbox.max_x, bbox.max_y),
        (bbox.min_x, bbox.min_y),
        (bbox.max_x, bbox.min_y),
    ];

    let mut min_row = i64::MAX;
    let mut max_row = i64::MIN;
    let mut min_col = i64::MAX;
    let mut max_col = i64::MIN;
    for (x, y) in corners {
        let (row, col) = transform.rowcol(x, y)?;
        min_row = min_row.min(row);
        max_row = max_row.max(row);
        min_col = min_col.min(col);
        max_col = max_col.max(col);
    }

    let col_start = min_col.clamp(0, raster_width as i64);
    let col_end = max_col.clamp(0, raster_width as i64);
    let row_start = min_row.clamp(0, raster_height as i64);
    let row_end = max_row.clamp(0, raster_height as i64);

    Ok(PixelWindow::new(
        col_start as usize,
        row_start as usize,
        (col_end - col_start).max(0) as usize,
        (row_end - row_start).max(0) as usize,
    ))
}

/// Reads one band of a raster within a geographic bounding box.
///
/// The raster is opened for the duration of a single call.
#[derive(Clone)]
pub struct WindowExtractor {
    opener: Arc<dyn RasterOpener>,
    policy: Arc<dyn NodataPolicy>,
}

impl WindowExtractor {
    /// Extractor using the default zero-or-NaN heuristic.
    pub fn new(opener: Arc<dyn RasterOpener>) -> Self {
        Self::with_policy(opener, Arc::new(ZeroOrNanHeuristic::default()))
    }

    pub fn with_policy(opener: Arc<dyn RasterOpener>, policy: Arc<dyn NodataPolicy>) -> Self {
        Self { opener, policy }
    }

    pub fn policy(&self) -> &dyn NodataPolicy {
        self.policy.as_ref()
    }

    /// Extract `band` (1-based) of the raster at `path` covering `bbox`.
    pub fn extract(&self, path: &Path, band: usize, bbox: &BoundingBox) -> Result<AoiWindow> {
        let mut dataset = self.opener.open(path)?;
        dataset.check_band(band)?;

        let transform = dataset.transform();
        let window = pixel_window(&transform, dataset.width(), dataset.height(), bbox)?;
        let local = transform.window_transform(window.col_off, window.row_off);

        let values = if window.is_empty() {
            Vec::new()
        } else {
            dataset.read_window(band, &window)?
        };
        let data = if window.is_empty() {
            WindowData::new(values, 0, 0)
        } else {
            WindowData::new(values, window.width, window.height)
        };
        let all_nodata = self.policy.is_all_nodata(&data);

        debug!(
            path = %path.display(),
            band,
            col_off = window.col_off,
            row_off = window.row_off,
            width = window.width,
            height = window.height,
            all_nodata,
            policy = self.policy.name(),
            "Extracted window"
        );

        Ok(AoiWindow {
            data,
            transform: local,
            window,
            all_nodata,
        })
    }
}

impl std::fmt::Debug for WindowExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowExtractor")
            .field("policy", &self.policy.name())
            .finish()
    }
}
