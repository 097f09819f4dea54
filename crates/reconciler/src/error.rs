//! Error types for reconciliation.

use std::path::{Path, PathBuf};

use thiserror::Error;
use zonal_common::CommonError;

use crate::validation::ValidationReport;

#[derive(Error, Debug)]
pub enum ReconcileError {
    /// Date catalog missing or malformed.
    #[error("date catalog {path}: {message}")]
    Catalog { path: PathBuf, message: String },

    /// Table column with no place in the canonical schema.
    #[error("{file}: column {column:?} {reason}")]
    Schema {
        file: PathBuf,
        column: String,
        reason: String,
    },

    /// Zone partition could not be read.
    #[error("zone partition {path}: {message}")]
    Partition { path: PathBuf, message: String },

    #[error("invalid table pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("failed to list {path}: {message}")]
    Listing { path: PathBuf, message: String },

    /// Writing the merged table failed; validation had already finished.
    #[error("failed to write merged table {output}: {source}")]
    Merge {
        output: PathBuf,
        report: Box<ValidationReport>,
        source: Box<ReconcileError>,
    },

    #[error(transparent)]
    Common(#[from] CommonError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReconcileError {
    pub fn catalog(path: &Path, message: impl ToString) -> Self {
        Self::Catalog {
            path: path.to_path_buf(),
            message: message.to_string(),
        }
    }

    pub fn schema(file: &Path, column: &str, reason: impl Into<String>) -> Self {
        Self::Schema {
            file: file.to_path_buf(),
            column: column.to_string(),
            reason: reason.into(),
        }
    }

    pub fn partition(path: &Path, message: impl ToString) -> Self {
        Self::Partition {
            path: path.to_path_buf(),
            message: message.to_string(),
        }
    }

    pub fn listing(path: &Path, message: impl ToString) -> Self {
        Self::Listing {
            path: path.to_path_buf(),
            message: message.to_string(),
        }
    }

    pub fn merge(output: &Path, report: ValidationReport, source: ReconcileError) -> Self {
        Self::Merge {
            output: output.to_path_buf(),
            report: Box::new(report),
            source: Box::new(source),
        }
    }

    /// Validation report carried by a failed merge.
    pub fn report(&self) -> Option<&ValidationReport> {
        match self {
            Self::Merge { report, .. } => Some(report.as_ref()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ReconcileError>;
