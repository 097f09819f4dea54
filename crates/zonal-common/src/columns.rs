//! Output column naming shared by partition tables and the merged table.

use chrono::NaiveDate;

use crate::band::Statistic;
use crate::date::parse_catalog_date;
use crate::error::{CommonError, CommonResult};

/// Per-zone descriptive columns that lead every output row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataColumn {
    Id,
    Fid1,
    LcGroup,
    LcType,
    Area,
}

/// Metadata columns in output order.
pub const METADATA_COLUMNS: [MetadataColumn; 5] = [
    MetadataColumn::Id,
    MetadataColumn::Fid1,
    MetadataColumn::LcGroup,
    MetadataColumn::LcType,
    MetadataColumn::Area,
];

impl MetadataColumn {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "Id",
            Self::Fid1 => "FID_1",
            Self::LcGroup => "LCGROUP",
            Self::LcType => "LCTYPE",
            Self::Area => "AREA",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        METADATA_COLUMNS.into_iter().find(|c| c.as_str() == name)
    }
}

/// Name of the statistic column for one (date, band, statistic).
///
/// Format: `YYYY-MM-DD_<band>_<statistic>`, e.g. `2019-03-01_VV_mean`.
pub fn stat_column_name(date: NaiveDate, band_name: &str, stat: Statistic) -> String {
    format!("{}_{}_{}", date.format("%Y-%m-%d"), band_name, stat.as_str())
}

/// A parsed output column name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnName {
    Metadata(MetadataColumn),
    Stat {
        date: NaiveDate,
        band: String,
        stat: Statistic,
    },
}

impl ColumnName {
    pub fn parse(name: &str) -> CommonResult<Self> {
        if let Some(meta) = MetadataColumn::from_name(name) {
            return Ok(Self::Metadata(meta));
        }

        let mut parts = name.rsplitn(3, '_');
        let (stat, band, date) = match (parts.next(), parts.next(), parts.next()) {
            (Some(stat), Some(band), Some(date)) if !band.is_empty() => (stat, band, date),
            _ => return Err(CommonError::InvalidColumnName(name.to_string())),
        };

        Ok(Self::Stat {
            date: parse_catalog_date(date)?,
            band: band.to_string(),
            stat: Statistic::parse(stat)?,
        })
    }
}

impl std::fmt::Display for ColumnName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Metadata(meta) => f.write_str(meta.as_str()),
            Self::Stat { date, band, stat } => {
                f.write_str(&stat_column_name(*date, band, *stat))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stat_column_name() {
        let date = NaiveDate::from_ymd_opt(2019, 3, 1).unwrap();
        assert_eq!(
            stat_column_name(date, "VV", Statistic::Variance),
            "2019-03-01_VV_variance"
        );
    }

    #[test]
    fn test_parse_column_names() {
        assert_eq!(
            ColumnName::parse("FID_1").unwrap(),
            ColumnName::Metadata(MetadataColumn::Fid1)
        );

        let parsed = ColumnName::parse("2019-04-30_VH_range").unwrap();
        assert_eq!(
            parsed,
            ColumnName::Stat {
                date: NaiveDate::from_ymd_opt(2019, 4, 30).unwrap(),
                band: "VH".to_string(),
                stat: Statistic::Range,
            }
        );
        assert_eq!(parsed.to_string(), "2019-04-30_VH_range");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(ColumnName::parse("area").is_err());
        assert!(ColumnName::parse("2019-04-30_VH_median").is_err());
        assert!(ColumnName::parse("20190430_VH_mean").is_err());
    }
}
