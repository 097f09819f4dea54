//! Error types for raster access.

use std::path::{Path, PathBuf};

use thiserror::Error;
use zonal_common::CommonError;

/// Errors that can occur while opening or reading a raster.
#[derive(Error, Debug)]
pub enum RasterError {
    /// The raster file does not exist.
    #[error("raster not found: {0}")]
    NotFound(PathBuf),

    /// The raster exists but could not be opened.
    #[error("failed to open raster {path}: {message}")]
    OpenFailed { path: PathBuf, message: String },

    /// Failed to decode raster data.
    #[error("failed to read raster data: {0}")]
    ReadFailed(String),

    /// The raster has no usable georeferencing tags.
    #[error("raster {0} has no geotransform")]
    MissingGeoreference(PathBuf),

    /// The requested band does not exist.
    #[error("band {band} out of range, raster has {count} band(s)")]
    BandOutOfRange { band: usize, count: usize },

    /// Sample type the reader cannot convert.
    #[error("unsupported sample format: {0}")]
    UnsupportedSampleFormat(String),

    /// Geotransform problem (e.g. a singular matrix).
    #[error("geotransform error: {0}")]
    Transform(#[from] CommonError),
}

impl RasterError {
    /// Create an OpenFailed error.
    pub fn open_failed(path: &Path, msg: impl Into<String>) -> Self {
        Self::OpenFailed {
            path: path.to_path_buf(),
            message: msg.into(),
        }
    }

    /// Create a ReadFailed error.
    pub fn read_failed(msg: impl Into<String>) -> Self {
        Self::ReadFailed(msg.into())
    }

    /// Map an io error on `path`, keeping "not found" distinguishable.
    pub fn from_io(path: &Path, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound(path.to_path_buf())
        } else {
            Self::open_failed(path, err.to_string())
        }
    }
}

impl From<tiff::TiffError> for RasterError {
    fn from(err: tiff::TiffError) -> Self {
        Self::ReadFailed(format!("TIFF: {}", err))
    }
}

/// Result type for raster operations.
pub type Result<T> = std::result::Result<T, RasterError>;
