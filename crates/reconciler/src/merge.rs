//! Reading partition tables and writing the merged table.

use std::io::Write;
use std::path::{Path, PathBuf};

use csv::StringRecord;

use crate::error::Result;
use crate::schema::{CanonicalSchema, HeaderMapping};

/// One partition table held in memory.
#[derive(Debug, Clone)]
pub struct TableFile {
    pub path: PathBuf,
    pub header: StringRecord,
    pub rows: Vec<StringRecord>,
}

impl TableFile {
    /// Read a table; rows must be as wide as the header.
    pub fn read(path: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new().from_path(path)?;
        let header = reader.headers()?.clone();
        let rows = reader.records().collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self {
            path: path.to_path_buf(),
            header,
            rows,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Writes canonical-width records; the header is written on creation.
pub struct MergedWriter<W: Write> {
    writer: csv::Writer<W>,
    rows: usize,
}

impl<W: Write> MergedWriter<W> {
    pub fn new(inner: W, schema: &CanonicalSchema) -> Result<Self> {
        let mut writer = csv::WriterBuilder::new()
            .quote_style(csv::QuoteStyle::NonNumeric)
            .from_writer(inner);
        writer.write_record(schema.columns())?;
        Ok(Self { writer, rows: 0 })
    }

    /// Copy every row of `table` through `mapping`. Cells are copied as
    /// text, unchanged.
    pub fn write_table(&mut self, mapping: &HeaderMapping, table: &TableFile) -> Result<usize> {
        for row in &table.rows {
            self.writer.write_record(mapping.project(row))?;
        }
        self.rows += table.len();
        Ok(table.len())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Flush and return the number of data rows written.
    pub fn finish(mut self) -> Result<usize> {
        self.writer.flush()?;
        Ok(self.rows)
    }
}
