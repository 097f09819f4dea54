//! Error types shared by the zonal statistics crates.

use thiserror::Error;

/// Result type alias using CommonError.
pub type CommonResult<T> = Result<T, CommonError>;

/// Errors raised while building or parsing the shared value types.
#[derive(Debug, Error)]
pub enum CommonError {
    #[error("Invalid acquisition date {year:04}-{month:02}-{day:02}")]
    InvalidDate { year: i32, month: u32, day: u32 },

    #[error("Invalid date string '{0}', expected YYYY-MM-DD")]
    InvalidDateString(String),

    #[error("Invalid column name '{0}'")]
    InvalidColumnName(String),

    #[error("Unknown statistic '{0}'")]
    UnknownStatistic(String),

    #[error("Geotransform is not invertible: {0:?}")]
    SingularTransform([f64; 6]),
}
