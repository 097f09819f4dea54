//! The list of acquisition dates shared by every merged partition.
//!
//! ```yaml
//! dates:
//!   - "2019-03-01"
//!   - "2019-03-02"
//! ```

use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;
use zonal_common::parse_catalog_date;

use crate::error::{ReconcileError, Result};

#[derive(Debug, Deserialize)]
struct CatalogFile {
    dates: Vec<String>,
}

/// Chronologically ordered, duplicate-free acquisition dates.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DateCatalog {
    dates: Vec<NaiveDate>,
}

impl DateCatalog {
    /// Sorts `dates`; duplicates are dropped.
    pub fn new(mut dates: Vec<NaiveDate>) -> Self {
        dates.sort();
        dates.dedup();
        Self { dates }
    }

    /// Parse `YYYY-MM-DD` strings.
    pub fn from_strings<S: AsRef<str>>(dates: &[S]) -> Result<Self> {
        let parsed = dates
            .iter()
            .map(|d| parse_catalog_date(d.as_ref().trim()))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self::new(parsed))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| ReconcileError::catalog(path, e))?;
        let file: CatalogFile =
            serde_yaml::from_str(&text).map_err(|e| ReconcileError::catalog(path, e))?;
        let catalog =
            Self::from_strings(&file.dates).map_err(|e| ReconcileError::catalog(path, e))?;
        if catalog.is_empty() {
            return Err(ReconcileError::catalog(path, "no dates"));
        }
        Ok(catalog)
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_and_deduplicated() {
        let catalog = DateCatalog::from_strings(&["2019-06-10", "2019-06-08", "2019-06-10"]).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.dates()[0], NaiveDate::from_ymd_opt(2019, 6, 8).unwrap());
    }

    #[test]
    fn test_invalid_date() {
        assert!(DateCatalog::from_strings(&["2019-02-30"]).is_err());
    }

    #[test]
    fn test_load_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dates.yaml");
        std::fs::write(&path, "dates:\n  - \"2019-03-02\"\n  - \"2019-03-01\"\n").unwrap();

        let catalog = DateCatalog::load(&path).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.dates()[1], NaiveDate::from_ymd_opt(2019, 3, 2).unwrap());
    }

    #[test]
    fn test_bundled_catalog() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/date_catalog.yaml");
        let catalog = DateCatalog::load(&path).unwrap();
        assert_eq!(catalog.len(), 244);
        assert_eq!(catalog.dates()[0], NaiveDate::from_ymd_opt(2019, 3, 1).unwrap());
    }

    #[test]
    fn test_load_missing() {
        let err = DateCatalog::load(Path::new("/no/such/dates.yaml")).unwrap_err();
        assert!(matches!(err, ReconcileError::Catalog { .. }));
    }
}
