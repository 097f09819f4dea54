//! Partition table validation and merging.
//!
//! Every zone partition is expected to have produced one table. Tables
//! differ in width (each only has the dates its images covered), so they
//! are projected onto a canonical schema built from a shared date catalog
//! before being concatenated.
//!
//! # Architecture
//!
//! ```text
//! partitions/*.shp ─► feature counts, expected table paths ─┐
//!                                                            ├─► ValidationReport
//! tables/<pattern> ─► TableFile::read (sorted by id, name) ─┘
//!                          │
//!                          ▼
//!          CanonicalSchema::map_header (reject file on error)
//!                          │
//!                          ▼
//!          MergedWriter::write_table ─► merged CSV
//! ```

pub mod catalog;
pub mod error;
pub mod merge;
pub mod partition;
pub mod schema;
pub mod validation;

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use zonal_common::Band;

pub use catalog::DateCatalog;
pub use error::{ReconcileError, Result};
pub use merge::{MergedWriter, TableFile};
pub use partition::{
    count_features, expected_table_path, list_matching, partition_id, table_partition_id,
};
pub use schema::{CanonicalSchema, HeaderMapping};
pub use validation::{CountMismatch, ValidationReport};

/// Default suffix of partition table file names.
pub const DEFAULT_TABLE_SUFFIX: &str = "_zonal_stats_for_ml.csv";

/// Default glob for partition tables.
pub const DEFAULT_TABLE_PATTERN: &str = "*_for_ml.csv";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Bands of the canonical schema, in column order.
    pub bands: Vec<Band>,
    pub table_suffix: String,
    pub table_pattern: String,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            bands: Band::defaults(),
            table_suffix: DEFAULT_TABLE_SUFFIX.to_string(),
            table_pattern: DEFAULT_TABLE_PATTERN.to_string(),
        }
    }
}

/// A table left out of the merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedTable {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconcileOutcome {
    pub report: ValidationReport,
    pub rejected: Vec<RejectedTable>,
    pub tables_merged: usize,
    pub rows_written: usize,
}

/// Validates and merges partition tables onto one schema.
#[derive(Debug, Clone)]
pub struct Reconciler {
    config: ReconcileConfig,
    schema: CanonicalSchema,
}

impl Reconciler {
    pub fn new(config: ReconcileConfig, catalog: &DateCatalog) -> Self {
        let schema = CanonicalSchema::new(&config.bands, catalog);
        Self { config, schema }
    }

    pub fn schema(&self) -> &CanonicalSchema {
        &self.schema
    }

    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    /// Validate every table in `tables_dir` against the zone partitions in
    /// `partitions_dir` and write the merged table to `output`.
    ///
    /// Tables are merged in (partition id, file name) order, so the same
    /// inputs always give the same output. A table whose header does not fit
    /// the schema is rejected as a whole; the others are still merged.
    ///
    /// Validation finishes and is logged before `output` is touched. If
    /// writing the merged table then fails, the error is
    /// [`ReconcileError::Merge`], which carries the report.
    pub fn reconcile(
        &self,
        tables_dir: &Path,
        partitions_dir: &Path,
        output: &Path,
    ) -> Result<ReconcileOutcome> {
        let mut outcome = ReconcileOutcome::default();
        let accepted = self.validate(tables_dir, partitions_dir, output, &mut outcome)?;
        outcome.report.log();

        match self.merge(&accepted, output) {
            Ok(rows) => outcome.rows_written = rows,
            Err(e) => {
                warn!(output = %output.display(), error = %e, "Merged table not written");
                return Err(ReconcileError::merge(output, outcome.report, e));
            }
        }
        outcome.tables_merged = accepted.len();

        info!(
            output = %output.display(),
            tables = outcome.tables_merged,
            rows = outcome.rows_written,
            rejected = outcome.rejected.len(),
            columns = self.schema.width(),
            "Merged partition tables"
        );

        Ok(outcome)
    }

    /// Fill the report and pick the tables to merge, in merge order.
    fn validate(
        &self,
        tables_dir: &Path,
        partitions_dir: &Path,
        output: &Path,
        outcome: &mut ReconcileOutcome,
    ) -> Result<Vec<(HeaderMapping, TableFile)>> {
        let suffix = &self.config.table_suffix;

        // Zone partitions: feature counts and expected tables
        let mut feature_counts: HashMap<String, usize> = HashMap::new();
        let mut known_ids: HashSet<String> = HashSet::new();
        for geometry in list_matching(partitions_dir, "*.shp")? {
            let id = partition_id(&partition::file_stem(&geometry)).to_string();
            known_ids.insert(id.clone());

            match count_features(&geometry) {
                Ok(count) => {
                    if feature_counts.insert(id.clone(), count).is_some() {
                        warn!(path = %geometry.display(), partition = %id, "Partition id used twice");
                    }
                }
                Err(e) => outcome.report.unreadable.push((geometry.clone(), e.to_string())),
            }

            let expected = expected_table_path(tables_dir, &geometry, suffix);
            if expected.is_file() {
                outcome.report.found += 1;
            } else {
                outcome.report.missing.push(expected);
            }
            outcome.report.expected += 1;
        }

        // Tables in merge order
        let mut tables: Vec<(String, PathBuf)> = list_matching(tables_dir, &self.config.table_pattern)?
            .into_iter()
            .filter(|path| !is_same_file(path, output))
            .map(|path| (table_partition_id(&path, suffix), path))
            .collect();
        tables.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.file_name().cmp(&b.1.file_name())));

        let mut accepted = Vec::with_capacity(tables.len());
        for (id, path) in tables {
            let table = match TableFile::read(&path) {
                Ok(table) => table,
                Err(e) => {
                    outcome.report.unreadable_tables.push((path.clone(), e.to_string()));
                    outcome.rejected.push(RejectedTable {
                        path,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            if table.is_empty() {
                outcome.report.empty.push(path.clone());
            }
            match feature_counts.get(&id) {
                Some(&expected) if !table.is_empty() && table.len() != expected => {
                    outcome.report.mismatched.push(CountMismatch {
                        file: path.clone(),
                        expected,
                        actual: table.len(),
                    });
                }
                None if !known_ids.contains(&id) => outcome.report.unmatched.push(path.clone()),
                _ => {}
            }

            if table.is_empty() {
                continue;
            }
            match self.schema.map_header(&path, &table.header) {
                Ok(mapping) => accepted.push((mapping, table)),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Rejected table with unknown columns");
                    outcome.rejected.push(RejectedTable {
                        path,
                        reason: e.to_string(),
                    });
                }
            }
        }

        Ok(accepted)
    }

    /// Write `tables` to a temp file beside `output`, then move it into
    /// place. Returns the number of data rows.
    fn merge(&self, tables: &[(HeaderMapping, TableFile)], output: &Path) -> Result<usize> {
        let dir = match output.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        let mut writer = MergedWriter::new(tmp.as_file_mut(), &self.schema)?;
        for (mapping, table) in tables {
            writer.write_table(mapping, table)?;
        }
        let rows = writer.finish()?;
        tmp.persist(output).map_err(|e| e.error)?;
        Ok(rows)
    }
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
