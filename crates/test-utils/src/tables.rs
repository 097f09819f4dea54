//! Partition table (CSV) fixtures.

use std::path::Path;

/// Write a partition table with the same quoting the aggregator uses.
///
/// Each row must be as wide as `header`; empty strings stand for missing
/// statistics.
pub fn write_partition_table(
    path: &Path,
    header: &[&str],
    rows: &[Vec<String>],
) -> Result<(), csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::NonNumeric)
        .from_path(path)?;
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}
