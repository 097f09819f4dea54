//! Windowed raster access for zonal statistics.
//!
//! A partition only ever needs the part of each scene that covers its
//! zones, so reads are expressed as a geographic bounding box which is
//! mapped onto the raster grid, clipped, and decoded one band at a time.
//!
//! # Architecture
//!
//! ```text
//! WindowExtractor::extract(path, band, bbox)
//!      │
//!      ├─► RasterOpener::open(path)          (GeoTIFF or in-memory)
//!      │
//!      ├─► pixel_window(transform, bbox)     (rows inverted vs. y)
//!      │
//!      ├─► RasterDataset::read_window(band)  (only intersecting chunks)
//!      │
//!      └─► NodataPolicy::is_all_nodata(window)
//!               │
//!               ▼
//!          AoiWindow { data, transform, all_nodata }
//! ```

pub mod dataset;
pub mod error;
pub mod geotiff;
pub mod memory;
pub mod nodata;
pub mod window;

pub use dataset::{PixelWindow, RasterDataset, RasterOpener};
pub use error::{RasterError, Result};
pub use geotiff::{GeoTiffDataset, GeoTiffOpener};
pub use memory::{MemoryRaster, MemoryRasterStore};
pub use nodata::{FillValuePolicy, NodataPolicy, ZeroOrNanHeuristic};
pub use window::{pixel_window, AoiWindow, WindowData, WindowExtractor};
