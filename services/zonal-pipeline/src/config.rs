//! Pipeline configuration.
//!
//! Loaded from YAML, then selectively overridden from the environment:
//!
//! ```yaml
//! buffer_distance: 100
//! workers: 8
//! nodata_tolerance: 0.0
//! date_catalog: date_catalog.yaml   # relative to this file
//! bands:
//!   - { index: 1, name: VV }
//!   - { index: 2, name: VH }
//! ```

use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use raster_io::ZeroOrNanHeuristic;
use reconciler::{DateCatalog, ReconcileConfig, DEFAULT_TABLE_PATTERN};
use serde::{Deserialize, Serialize};
use zonal_common::Band;
use zonal_processor::{AggregatorConfig, DEFAULT_OUTPUT_SUFFIX};

/// Default location of the bundled date catalog.
pub const DEFAULT_DATE_CATALOG: &str = "config/date_catalog.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Distance (map units) the zone extent is grown by before reading
    pub buffer_distance: f64,

    /// Bands sampled on every image, in column order
    pub bands: Vec<Band>,

    /// Partitions processed in parallel (0 = one per CPU)
    pub workers: usize,

    /// Partition table file name suffix
    pub output_suffix: String,

    /// Glob selecting partition tables to merge
    pub table_pattern: String,

    /// YAML date catalog file
    pub date_catalog: Option<PathBuf>,

    /// Inline date catalog, used instead of `date_catalog`
    pub dates: Option<Vec<String>>,

    /// Window statistics within this distance of zero count as nodata
    pub nodata_tolerance: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            buffer_distance: 100.0,
            bands: Band::defaults(),
            workers: 0,
            output_suffix: DEFAULT_OUTPUT_SUFFIX.to_string(),
            table_pattern: DEFAULT_TABLE_PATTERN.to_string(),
            date_catalog: Some(PathBuf::from(DEFAULT_DATE_CATALOG)),
            dates: None,
            nodata_tolerance: 0.0,
        }
    }
}

impl PipelineConfig {
    /// Read a YAML config. A relative `date_catalog` is resolved against the
    /// config file's directory.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read pipeline config from {:?}", path))?;

        let mut config: PipelineConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse pipeline config from {:?}", path))?;

        if let (Some(catalog), Some(dir)) = (config.date_catalog.as_mut(), path.parent()) {
            if catalog.is_relative() {
                *catalog = dir.join(&*catalog);
            }
        }

        Ok(config)
    }

    /// Apply `ZONAL_*` environment variables on top of the loaded values.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| env::var(key).ok())
    }

    /// Apply overrides from any key lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("ZONAL_BUFFER_DISTANCE") {
            self.buffer_distance = value
                .trim()
                .parse()
                .with_context(|| format!("Invalid ZONAL_BUFFER_DISTANCE: {:?}", value))?;
        }
        if let Some(value) = lookup("ZONAL_WORKERS") {
            self.workers = value
                .trim()
                .parse()
                .with_context(|| format!("Invalid ZONAL_WORKERS: {:?}", value))?;
        }
        if let Some(value) = lookup("ZONAL_DATE_CATALOG") {
            self.date_catalog = Some(PathBuf::from(value));
            self.dates = None;
        }
        if let Some(value) = lookup("ZONAL_NODATA_TOLERANCE") {
            self.nodata_tolerance = value
                .trim()
                .parse()
                .with_context(|| format!("Invalid ZONAL_NODATA_TOLERANCE: {:?}", value))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !self.buffer_distance.is_finite() || self.buffer_distance < 0.0 {
            bail!("buffer_distance must be a non-negative number, got {}", self.buffer_distance);
        }
        if !self.nodata_tolerance.is_finite() || self.nodata_tolerance < 0.0 {
            bail!("nodata_tolerance must be a non-negative number, got {}", self.nodata_tolerance);
        }

        if self.bands.is_empty() {
            bail!("At least one band must be configured");
        }
        let mut names = HashSet::new();
        let mut indexes = HashSet::new();
        for band in &self.bands {
            if band.index == 0 {
                bail!("Band {} has index 0; band indexes start at 1", band.name);
            }
            if band.name.is_empty() || band.name.contains('_') {
                bail!("Band name {:?} must be non-empty and contain no '_'", band.name);
            }
            if !names.insert(band.name.as_str()) {
                bail!("Band name {} is configured twice", band.name);
            }
            if !indexes.insert(band.index) {
                bail!("Band index {} is configured twice", band.index);
            }
        }

        if self.output_suffix.is_empty() {
            bail!("output_suffix must not be empty");
        }
        if self.table_pattern.is_empty() {
            bail!("table_pattern must not be empty");
        }

        match (&self.date_catalog, &self.dates) {
            (None, None) => bail!("Either date_catalog or dates must be set"),
            (Some(_), Some(_)) => bail!("date_catalog and dates are mutually exclusive"),
            _ => {}
        }

        Ok(())
    }

    /// The configured date catalog, inline or from file.
    pub fn date_catalog(&self) -> Result<DateCatalog> {
        let catalog = match (&self.dates, &self.date_catalog) {
            (Some(dates), _) => {
                DateCatalog::from_strings(dates).context("Invalid inline date catalog")?
            }
            (None, Some(path)) => DateCatalog::load(path)
                .with_context(|| format!("Failed to load date catalog from {:?}", path))?,
            (None, None) => bail!("No date catalog configured"),
        };
        if catalog.is_empty() {
            bail!("Date catalog is empty");
        }
        Ok(catalog)
    }

    pub fn aggregator_config(&self) -> AggregatorConfig {
        AggregatorConfig {
            buffer_distance: self.buffer_distance,
            bands: self.bands.clone(),
            output_suffix: self.output_suffix.clone(),
        }
    }

    pub fn reconcile_config(&self) -> ReconcileConfig {
        ReconcileConfig {
            bands: self.bands.clone(),
            table_suffix: self.output_suffix.clone(),
            table_pattern: self.table_pattern.clone(),
        }
    }

    pub fn nodata_policy(&self) -> ZeroOrNanHeuristic {
        ZeroOrNanHeuristic::new(self.nodata_tolerance)
    }
}
