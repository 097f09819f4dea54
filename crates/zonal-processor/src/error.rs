//! Error types for partition processing.

use std::path::{Path, PathBuf};

use raster_io::RasterError;
use thiserror::Error;
use zonal_common::CommonError;

/// Errors that fail an image or a whole partition.
#[derive(Error, Debug)]
pub enum ZonalError {
    /// Raster could not be opened or read.
    #[error(transparent)]
    Raster(#[from] RasterError),

    /// Invalid date, transform or column name.
    #[error(transparent)]
    Common(#[from] CommonError),

    /// Zone geometry that cannot be used for statistics.
    #[error("invalid geometry for zone {zone}: {message}")]
    Geometry { zone: i64, message: String },

    /// Zone partition could not be read.
    #[error("failed to read zone partition {path}: {message}")]
    ZonePartition { path: PathBuf, message: String },

    /// A required zone attribute is absent or has an unusable type.
    #[error("zone partition {path}: attribute {field} {problem}")]
    ZoneAttribute {
        path: PathBuf,
        field: String,
        problem: String,
    },

    /// Image metadata catalog could not be parsed.
    #[error("image metadata {path}: {message}")]
    Metadata { path: PathBuf, message: String },

    /// Footprint is not a hex-encoded WKB polygon.
    #[error("invalid footprint: {0}")]
    Footprint(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ZonalError {
    pub fn geometry(zone: i64, message: impl Into<String>) -> Self {
        Self::Geometry {
            zone,
            message: message.into(),
        }
    }

    pub fn zone_partition(path: &Path, message: impl ToString) -> Self {
        Self::ZonePartition {
            path: path.to_path_buf(),
            message: message.to_string(),
        }
    }

    pub fn zone_attribute(path: &Path, field: &str, problem: impl Into<String>) -> Self {
        Self::ZoneAttribute {
            path: path.to_path_buf(),
            field: field.to_string(),
            problem: problem.into(),
        }
    }

    pub fn metadata(path: &Path, message: impl ToString) -> Self {
        Self::Metadata {
            path: path.to_path_buf(),
            message: message.to_string(),
        }
    }

    pub fn footprint(message: impl Into<String>) -> Self {
        Self::Footprint(message.into())
    }

    /// True for missing inputs, as opposed to malformed ones.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Raster(RasterError::NotFound(_)) => true,
            Self::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ZonalError>;
