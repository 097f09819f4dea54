//! Common types shared across the zonal statistics crates.

pub mod band;
pub mod bbox;
pub mod columns;
pub mod date;
pub mod error;
pub mod transform;

pub use band::{Band, Statistic, STATISTICS};
pub use bbox::BoundingBox;
pub use columns::{stat_column_name, ColumnName, MetadataColumn, METADATA_COLUMNS};
pub use date::{acquisition_date, parse_catalog_date};
pub use error::{CommonError, CommonResult};
pub use transform::GeoTransform;
