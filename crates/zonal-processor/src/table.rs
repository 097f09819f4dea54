//! Partition tables: one row per zone, one column per (band, date, statistic).

use std::io::Write;
use std::path::Path;

use chrono::NaiveDate;
use zonal_common::{stat_column_name, Band, METADATA_COLUMNS, STATISTICS};

use crate::accumulator::StatisticTable;
use crate::error::Result;
use crate::zones::ZoneDescriptor;

/// A fully assembled partition table.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionTable {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl PartitionTable {
    /// Metadata columns, then for each band, each date, each statistic.
    pub fn header_for(bands: &[Band], dates: &[NaiveDate]) -> Vec<String> {
        let mut header: Vec<String> = METADATA_COLUMNS
            .iter()
            .map(|c| c.as_str().to_string())
            .collect();
        for band in bands {
            for date in dates {
                for stat in STATISTICS {
                    header.push(stat_column_name(*date, &band.name, stat));
                }
            }
        }
        header
    }

    /// Assemble rows for every zone that has at least one entry, in zone id
    /// order. Missing (band, date) cells are empty.
    pub fn build(
        zones: &[ZoneDescriptor],
        bands: &[Band],
        dates: &[NaiveDate],
        stats: &StatisticTable,
    ) -> Self {
        let header = Self::header_for(bands, dates);

        let mut with_entries: Vec<&ZoneDescriptor> =
            zones.iter().filter(|z| stats.contains_zone(z.id)).collect();
        with_entries.sort_by_key(|z| z.id);

        let rows = with_entries
            .into_iter()
            .map(|zone| {
                let mut row = Vec::with_capacity(header.len());
                row.push(zone.id.to_string());
                row.push(zone.fid_1.to_string());
                row.push(zone.lcgroup.clone());
                row.push(zone.lctype.clone());
                row.push(zone.area.to_string());
                for band in bands {
                    for date in dates {
                        let entry = stats.get(zone.id, band.index, *date);
                        for stat in STATISTICS {
                            row.push(
                                entry
                                    .map(|e| e.value(stat).to_string())
                                    .unwrap_or_default(),
                            );
                        }
                    }
                }
                row
            })
            .collect();

        Self { header, rows }
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Write as CSV with non-numeric fields quoted.
    ///
    /// The file appears at `path` only once it is complete.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        {
            let mut writer = csv::WriterBuilder::new()
                .quote_style(csv::QuoteStyle::NonNumeric)
                .from_writer(tmp.as_file_mut());
            writer.write_record(&self.header)?;
            for row in &self.rows {
                writer.write_record(row)?;
            }
            writer.flush()?;
        }
        tmp.as_file_mut().flush()?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }
}
