//! Partition naming and discovery.
//!
//! A zone partition `zones_0042.shp` has partition id `0042` (the last
//! `_`-separated token of its stem) and is expected to produce
//! `zones_0042<suffix>` among the tables.

use std::path::{Path, PathBuf};

use glob::Pattern;
use walkdir::WalkDir;

use crate::error::{ReconcileError, Result};

/// Last `_`-separated token of a file stem.
pub fn partition_id(stem: &str) -> &str {
    stem.rsplit('_').next().unwrap_or(stem)
}

/// Partition id of a table file: its name with `suffix` removed, then the
/// last `_` token. Names without the suffix fall back to the file stem.
pub fn table_partition_id(path: &Path, suffix: &str) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match name.strip_suffix(suffix) {
        Some(stem) => partition_id(stem).to_string(),
        None => partition_id(&file_stem(path)).to_string(),
    }
}

/// Table path expected for a zone partition.
pub fn expected_table_path(tables_dir: &Path, geometry: &Path, suffix: &str) -> PathBuf {
    tables_dir.join(format!("{}{}", file_stem(geometry), suffix))
}

pub(crate) fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Files directly inside `dir` whose names match `pattern`, sorted by name.
pub fn list_matching(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let pattern = Pattern::new(pattern)?;
    let mut files = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| ReconcileError::listing(dir, e))?;
        if !entry.file_type().is_file() {
            continue;
        }
        if pattern.matches(&entry.file_name().to_string_lossy()) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

/// Number of features in a zone partition shapefile.
pub fn count_features(path: &Path) -> Result<usize> {
    let mut reader =
        shapefile::Reader::from_path(path).map_err(|e| ReconcileError::partition(path, e))?;
    let mut count = 0;
    for result in reader.iter_shapes_and_records() {
        result.map_err(|e| ReconcileError::partition(path, e))?;
        count += 1;
    }
    Ok(count)
}
