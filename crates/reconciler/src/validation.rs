//! Completeness checks of partition tables against their zone partitions.
//!
//! Nothing here fails a run: every finding is collected so the report can
//! be printed in full at the end.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use tracing::{info, warn};

/// A table whose row count differs from its partition's feature count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountMismatch {
    pub file: PathBuf,
    /// Features in the zone partition.
    pub expected: usize,
    /// Data rows in the table.
    pub actual: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// Zone partitions found.
    pub expected: usize,
    /// Zone partitions whose table exists.
    pub found: usize,
    /// Expected table paths that do not exist.
    pub missing: Vec<PathBuf>,
    /// Tables with a header but no rows.
    pub empty: Vec<PathBuf>,
    pub mismatched: Vec<CountMismatch>,
    /// Tables with no zone partition of the same id.
    pub unmatched: Vec<PathBuf>,
    /// Zone partitions whose feature count could not be read.
    pub unreadable: Vec<(PathBuf, String)>,
    /// Tables that could not be parsed; they contribute no rows.
    pub unreadable_tables: Vec<(PathBuf, String)>,
}

impl ValidationReport {
    /// Nothing listed in any section.
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty()
            && self.empty.is_empty()
            && self.mismatched.is_empty()
            && self.unmatched.is_empty()
            && self.unreadable.is_empty()
            && self.unreadable_tables.is_empty()
    }

    /// Emit the report as structured log events.
    pub fn log(&self) {
        info!(
            expected = self.expected,
            found = self.found,
            "Partition tables found"
        );
        for path in &self.missing {
            warn!(path = %path.display(), "Partition table missing");
        }
        for path in &self.empty {
            warn!(path = %path.display(), "Partition table has no rows");
        }
        for m in &self.mismatched {
            warn!(
                path = %m.file.display(),
                features = m.expected,
                rows = m.actual,
                "Row count differs from zone count"
            );
        }
        for path in &self.unmatched {
            warn!(path = %path.display(), "No zone partition for table");
        }
        for (path, error) in &self.unreadable {
            warn!(path = %path.display(), %error, "Zone partition unreadable");
        }
        for (path, error) in &self.unreadable_tables {
            warn!(path = %path.display(), %error, "Partition table unreadable");
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "There are {} of {} expected partition tables",
            self.found, self.expected
        )?;

        if !self.missing.is_empty() {
            writeln!(f, "\nMissing tables:")?;
            for path in &self.missing {
                writeln!(f, "{}", path.display())?;
            }
        }
        if !self.empty.is_empty() {
            writeln!(f, "\nTables with no records:")?;
            for path in &self.empty {
                writeln!(f, "{}", path.display())?;
            }
        }
        if !self.mismatched.is_empty() {
            writeln!(f, "\nTables whose record count differs from the zone partition:")?;
            for m in &self.mismatched {
                writeln!(
                    f,
                    "{} features in partition: {}, records in table: {}",
                    m.file.display(),
                    m.expected,
                    m.actual
                )?;
            }
        }
        if !self.unmatched.is_empty() {
            writeln!(f, "\nTables without a zone partition:")?;
            for path in &self.unmatched {
                writeln!(f, "{}", path.display())?;
            }
        }
        if !self.unreadable.is_empty() {
            writeln!(f, "\nUnreadable zone partitions:")?;
            for (path, error) in &self.unreadable {
                writeln!(f, "{}: {}", path.display(), error)?;
            }
        }
        if !self.unreadable_tables.is_empty() {
            writeln!(f, "\nUnreadable tables:")?;
            for (path, error) in &self.unreadable_tables {
                writeln!(f, "{}: {}", path.display(), error)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_order() {
        let report = ValidationReport {
            expected: 3,
            found: 2,
            missing: vec![PathBuf::from("t/zones_3_zonal_stats_for_ml.csv")],
            empty: vec![PathBuf::from("t/zones_2_zonal_stats_for_ml.csv")],
            mismatched: vec![CountMismatch {
                file: PathBuf::from("t/zones_1_zonal_stats_for_ml.csv"),
                expected: 50,
                actual: 48,
            }],
            ..Default::default()
        };

        let text = report.to_string();
        assert!(text.starts_with("There are 2 of 3 expected partition tables\n"));
        let missing = text.find("Missing tables").unwrap();
        let empty = text.find("no records").unwrap();
        let mismatched = text.find("features in partition: 50, records in table: 48").unwrap();
        assert!(missing < empty && empty < mismatched);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_unreadable_table_listed() {
        let report = ValidationReport {
            expected: 1,
            found: 1,
            unreadable_tables: vec![(
                PathBuf::from("t/zones_1_zonal_stats_for_ml.csv"),
                "found record with 3 fields, but the previous record has 8 fields".into(),
            )],
            ..Default::default()
        };
        assert!(!report.is_clean());
        let text = report.to_string();
        assert!(text.contains("Unreadable tables:\nt/zones_1_zonal_stats_for_ml.csv: found record"));
    }

    #[test]
    fn test_clean_report() {
        let report = ValidationReport {
            expected: 1,
            found: 1,
            ..Default::default()
        };
        assert!(report.is_clean());
        assert_eq!(report.to_string(), "There are 1 of 1 expected partition tables\n");
    }
}
