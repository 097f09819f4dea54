//! Aggregator configuration.

use serde::{Deserialize, Serialize};
use zonal_common::Band;

/// Suffix appended to a zone partition's file stem to name its table.
pub const DEFAULT_OUTPUT_SUFFIX: &str = "_zonal_stats_for_ml.csv";

/// Settings for one partition aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Distance (map units) the zone extent is grown by before reading.
    pub buffer_distance: f64,

    /// Bands sampled on every image, in column order.
    pub bands: Vec<Band>,

    /// Partition table file name suffix.
    pub output_suffix: String,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            buffer_distance: 100.0,
            bands: Band::defaults(),
            output_suffix: DEFAULT_OUTPUT_SUFFIX.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AggregatorConfig::default();
        assert_eq!(config.buffer_distance, 100.0);
        assert_eq!(config.bands, vec![Band::vv(), Band::vh()]);
        assert_eq!(config.output_suffix, "_zonal_stats_for_ml.csv");
    }
}
