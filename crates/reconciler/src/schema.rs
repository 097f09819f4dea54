//! The canonical merged-table schema.
//!
//! Metadata columns first, then for each band, each catalog date, each
//! statistic. The schema is built once and only read afterwards.

use std::collections::HashMap;
use std::path::Path;

use csv::StringRecord;
use zonal_common::{stat_column_name, Band, ColumnName, METADATA_COLUMNS, STATISTICS};

use crate::catalog::DateCatalog;
use crate::error::{ReconcileError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalSchema {
    columns: Vec<String>,
    positions: HashMap<String, usize>,
}

impl CanonicalSchema {
    pub fn new(bands: &[Band], catalog: &DateCatalog) -> Self {
        let mut columns: Vec<String> = METADATA_COLUMNS
            .iter()
            .map(|c| c.as_str().to_string())
            .collect();
        for band in bands {
            for date in catalog.dates() {
                for stat in STATISTICS {
                    columns.push(stat_column_name(*date, &band.name, stat));
                }
            }
        }

        let positions = columns
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();

        Self { columns, positions }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn position(&self, column: &str) -> Option<usize> {
        self.positions.get(column).copied()
    }

    /// Map a table header onto canonical positions.
    ///
    /// Fails on the first column the schema does not know, or on a column
    /// repeated in the header.
    pub fn map_header(&self, file: &Path, header: &StringRecord) -> Result<HeaderMapping> {
        let mut targets = Vec::with_capacity(header.len());
        let mut used = vec![false; self.width()];

        for name in header.iter() {
            let Some(position) = self.position(name) else {
                let reason = match ColumnName::parse(name) {
                    Ok(_) => "is not in the date catalog or band list",
                    Err(_) => "is not a recognised column name",
                };
                return Err(ReconcileError::schema(file, name, reason));
            };
            if std::mem::replace(&mut used[position], true) {
                return Err(ReconcileError::schema(file, name, "appears more than once"));
            }
            targets.push(position);
        }

        Ok(HeaderMapping {
            targets,
            width: self.width(),
        })
    }
}

/// Canonical position of every column of one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderMapping {
    targets: Vec<usize>,
    width: usize,
}

impl HeaderMapping {
    /// Place `row`'s cells at their canonical positions; unmapped cells are
    /// empty.
    pub fn project<'r>(&self, row: &'r StringRecord) -> Vec<&'r str> {
        let mut out = vec![""; self.width];
        for (cell, &target) in row.iter().zip(&self.targets) {
            out[target] = cell;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> CanonicalSchema {
        let catalog = DateCatalog::from_strings(&["2019-03-02", "2019-03-01"]).unwrap();
        CanonicalSchema::new(&Band::defaults(), &catalog)
    }

    #[test]
    fn test_column_order() {
        let schema = schema();
        assert_eq!(schema.width(), 5 + 2 * 2 * 3);
        assert_eq!(schema.columns()[4], "AREA");
        assert_eq!(schema.columns()[5], "2019-03-01_VV_mean");
        assert_eq!(schema.columns()[10], "2019-03-02_VV_variance");
        assert_eq!(schema.columns()[11], "2019-03-01_VH_mean");
        assert_eq!(schema.position("2019-03-02_VH_range"), Some(15));
    }

    #[test]
    fn test_project_row() {
        let schema = schema();
        let header = StringRecord::from(vec!["Id", "2019-03-02_VH_mean", "AREA"]);
        let mapping = schema.map_header(Path::new("t.csv"), &header).unwrap();

        let row = StringRecord::from(vec!["7", "0.25", "120.5"]);
        let projected = mapping.project(&row);
        assert_eq!(projected.len(), schema.width());
        assert_eq!(projected[0], "7");
        assert_eq!(projected[4], "120.5");
        assert_eq!(projected[14], "0.25");
        assert_eq!(projected[1], "");
    }

    #[test]
    fn test_unknown_column_rejected() {
        let schema = schema();
        let header = StringRecord::from(vec!["Id", "2020-01-01_VV_mean"]);
        let err = schema.map_header(Path::new("t.csv"), &header).unwrap_err();
        match err {
            ReconcileError::Schema { column, reason, .. } => {
                assert_eq!(column, "2020-01-01_VV_mean");
                assert!(reason.contains("catalog"));
            }
            other => panic!("unexpected error {other:?}"),
        }

        let header = StringRecord::from(vec!["Id", "notes"]);
        assert!(schema.map_header(Path::new("t.csv"), &header).is_err());
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let header = StringRecord::from(vec!["Id", "Id"]);
        assert!(schema().map_header(Path::new("t.csv"), &header).is_err());
    }
}
