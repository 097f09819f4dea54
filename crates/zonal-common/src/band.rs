//! Raster bands and the statistics reported per band.

use serde::{Deserialize, Serialize};

use crate::error::{CommonError, CommonResult};

/// A raster band read independently for every image.
///
/// `index` is 1-based as in GDAL/rasterio; `name` is the label used in
/// column names (the polarisation for Sentinel-1 scenes).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Band {
    pub index: usize,
    pub name: String,
}

impl Band {
    pub fn new(index: usize, name: impl Into<String>) -> Self {
        Self {
            index,
            name: name.into(),
        }
    }

    /// Band 1, vertical transmit / vertical receive.
    pub fn vv() -> Self {
        Self::new(1, "VV")
    }

    /// Band 2, vertical transmit / horizontal receive.
    pub fn vh() -> Self {
        Self::new(2, "VH")
    }

    /// The two bands every image is sampled on.
    pub fn defaults() -> Vec<Band> {
        vec![Self::vv(), Self::vh()]
    }
}

/// Per-band statistics written to the output tables, in column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Statistic {
    Mean,
    Range,
    Variance,
}

/// Statistic column order within a (band, date) group.
pub const STATISTICS: [Statistic; 3] = [Statistic::Mean, Statistic::Range, Statistic::Variance];

impl Statistic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Range => "range",
            Self::Variance => "variance",
        }
    }

    pub fn parse(s: &str) -> CommonResult<Self> {
        match s {
            "mean" => Ok(Self::Mean),
            "range" => Ok(Self::Range),
            "variance" => Ok(Self::Variance),
            other => Err(CommonError::UnknownStatistic(other.to_string())),
        }
    }
}

impl std::fmt::Display for Statistic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bands() {
        let bands = Band::defaults();
        assert_eq!(bands.len(), 2);
        assert_eq!(bands[0], Band::new(1, "VV"));
        assert_eq!(bands[1], Band::new(2, "VH"));
    }

    #[test]
    fn test_statistic_parse() {
        for stat in STATISTICS {
            assert_eq!(Statistic::parse(stat.as_str()).unwrap(), stat);
        }
        assert!(Statistic::parse("median").is_err());
    }

    #[test]
    fn test_band_yaml() {
        let band: Band = serde_yaml::from_str("index: 2\nname: VH\n").unwrap();
        assert_eq!(band, Band::vh());
    }
}
