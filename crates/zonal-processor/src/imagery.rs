//! Image metadata catalog.
//!
//! The catalog is a CSV with one row per scene:
//!
//! ```text
//! path_to_img,image_day,image_month,image_year,geom_bng
//! /data/s1/S1A_20200105.tif,5,1,2020,0103000020346C...
//! ```
//!
//! `geom_bng` is the scene footprint as hex WKB and may be empty.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use geo::{Intersects, MultiPolygon, Rect};
use serde::Deserialize;
use tracing::{debug, info, warn};
use zonal_common::{acquisition_date, BoundingBox};

use crate::error::{Result, ZonalError};
use crate::footprint::parse_hex_footprint;

/// One scene of the time series.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRecord {
    pub path: PathBuf,
    pub day: u32,
    pub month: u32,
    pub year: i32,
    pub footprint: Option<MultiPolygon<f64>>,
}

impl ImageRecord {
    pub fn new(path: impl Into<PathBuf>, day: u32, month: u32, year: i32) -> Self {
        Self {
            path: path.into(),
            day,
            month,
            year,
            footprint: None,
        }
    }

    pub fn with_footprint(mut self, footprint: MultiPolygon<f64>) -> Self {
        self.footprint = Some(footprint);
        self
    }

    /// Acquisition date; fails for impossible day/month/year combinations.
    pub fn date(&self) -> Result<NaiveDate> {
        Ok(acquisition_date(self.day, self.month, self.year)?)
    }

    /// Whether the scene may cover `aoi`. Records without a footprint are
    /// always kept.
    pub fn may_cover(&self, aoi: &BoundingBox) -> bool {
        match &self.footprint {
            None => true,
            Some(footprint) => {
                let rect = Rect::new((aoi.min_x, aoi.min_y), (aoi.max_x, aoi.max_y));
                footprint.intersects(&rect)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct CatalogRow {
    path_to_img: String,
    image_day: u32,
    image_month: u32,
    image_year: i32,
    #[serde(default)]
    geom_bng: Option<String>,
}

/// Read every record of an image metadata CSV.
///
/// Paths are unique; a repeated path keeps its first row.
pub fn load_image_records(path: &Path) -> Result<Vec<ImageRecord>> {
    if !path.is_file() {
        return Err(ZonalError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("image metadata {} not found", path.display()),
        )));
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| ZonalError::metadata(path, e))?;

    let mut seen = HashSet::new();
    let mut records = Vec::new();
    for (line, row) in reader.deserialize::<CatalogRow>().enumerate() {
        let row = row.map_err(|e| ZonalError::metadata(path, e))?;

        let footprint = match row.geom_bng.as_deref() {
            None | Some("") => None,
            Some(hex) => Some(parse_hex_footprint(hex).map_err(|e| {
                ZonalError::metadata(path, format!("row {}: {}", line + 1, e))
            })?),
        };

        let image_path = PathBuf::from(row.path_to_img);
        if !seen.insert(image_path.clone()) {
            warn!(path = %image_path.display(), "Duplicate image in metadata, keeping first");
            continue;
        }

        records.push(ImageRecord {
            path: image_path,
            day: row.image_day,
            month: row.image_month,
            year: row.image_year,
            footprint,
        });
    }

    debug!(path = %path.display(), records = records.len(), "Loaded image metadata");
    Ok(records)
}

/// Keep the records whose footprint intersects `aoi`.
pub fn filter_by_aoi(records: &[ImageRecord], aoi: &BoundingBox) -> Vec<ImageRecord> {
    let kept: Vec<ImageRecord> = records
        .iter()
        .filter(|r| r.may_cover(aoi))
        .cloned()
        .collect();
    info!(
        total = records.len(),
        kept = kept.len(),
        "Filtered image metadata by partition AOI"
    );
    kept
}
