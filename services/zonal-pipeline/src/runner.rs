//! Parallel extraction over a directory of zone partitions.
//!
//! Every partition is an independent task on a rayon pool. A failing
//! partition becomes a failed [`PartitionOutcome`]; the other tasks run to
//! completion and all outcomes end up in the [`RunSummary`].

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use raster_io::{GeoTiffOpener, WindowExtractor};
use rayon::prelude::*;
use reconciler::list_matching;
use serde::Serialize;
use tracing::{error, info};
use zonal_processor::{
    filter_by_aoi, load_image_records, ImageRecord, PartitionAggregator, ZonePartition,
};

use crate::config::PipelineConfig;

/// Result of one partition task.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartitionOutcome {
    pub partition: PathBuf,
    #[serde(flatten)]
    pub status: PartitionStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PartitionStatus {
    Ok {
        table: PathBuf,
        zones: usize,
        rows: usize,
        images: usize,
        images_skipped: usize,
        entries: usize,
    },
    Failed {
        error: String,
    },
}

impl PartitionOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self.status, PartitionStatus::Ok { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub elapsed_secs: f64,
    pub images_listed: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Sorted by partition path.
    pub outcomes: Vec<PartitionOutcome>,
}

impl RunSummary {
    pub fn partitions(&self) -> usize {
        self.outcomes.len()
    }

    pub fn failures(&self) -> impl Iterator<Item = &PartitionOutcome> {
        self.outcomes.iter().filter(|o| !o.is_ok())
    }
}

/// Runs the aggregator over every `*.shp` in a directory.
#[derive(Debug, Clone)]
pub struct ExtractRunner {
    aggregator: PartitionAggregator,
    workers: usize,
}

impl ExtractRunner {
    /// GeoTIFF-backed runner using the configured nodata tolerance.
    pub fn new(config: &PipelineConfig) -> Self {
        let extractor = WindowExtractor::with_policy(
            Arc::new(GeoTiffOpener),
            Arc::new(config.nodata_policy()),
        );
        let aggregator = PartitionAggregator::new(config.aggregator_config(), extractor);
        Self::with_aggregator(aggregator, config.workers)
    }

    pub fn with_aggregator(aggregator: PartitionAggregator, workers: usize) -> Self {
        Self {
            aggregator,
            workers,
        }
    }

    /// Process every partition in `partitions_dir` against the images listed
    /// in `metadata`, writing one table per partition to `output_dir`.
    ///
    /// Only problems with the shared inputs (metadata, directories, pool)
    /// are returned as errors.
    pub fn run(
        &self,
        partitions_dir: &Path,
        metadata: &Path,
        output_dir: &Path,
    ) -> Result<RunSummary> {
        let started_at = Utc::now();
        let start = Instant::now();

        let images = load_image_records(metadata)
            .with_context(|| format!("Failed to load image metadata from {:?}", metadata))?;
        let partitions = list_matching(partitions_dir, "*.shp")
            .with_context(|| format!("Failed to list zone partitions in {:?}", partitions_dir))?;
        fs::create_dir_all(output_dir)
            .with_context(|| format!("Failed to create output directory {:?}", output_dir))?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("zonal-worker-{}", i))
            .build()
            .context("Failed to build worker pool")?;

        info!(
            partitions = partitions.len(),
            images = images.len(),
            workers = pool.current_num_threads(),
            "Starting extraction"
        );

        let mut outcomes: Vec<PartitionOutcome> = pool.install(|| {
            partitions
                .par_iter()
                .map(|path| self.process(path, &images, output_dir))
                .collect()
        });
        outcomes.sort_by(|a, b| a.partition.cmp(&b.partition));

        let succeeded = outcomes.iter().filter(|o| o.is_ok()).count();
        let summary = RunSummary {
            started_at,
            elapsed_secs: start.elapsed().as_secs_f64(),
            images_listed: images.len(),
            succeeded,
            failed: outcomes.len() - succeeded,
            outcomes,
        };

        info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            elapsed_secs = summary.elapsed_secs,
            "Extraction finished"
        );
        Ok(summary)
    }

    /// One partition task. Never fails; errors become the outcome.
    pub fn process(
        &self,
        path: &Path,
        images: &[ImageRecord],
        output_dir: &Path,
    ) -> PartitionOutcome {
        let status = match self.try_process(path, images, output_dir) {
            Ok(status) => status,
            Err(e) => {
                error!(partition = %path.display(), error = %e, "Partition failed");
                PartitionStatus::Failed {
                    error: e.to_string(),
                }
            }
        };
        PartitionOutcome {
            partition: path.to_path_buf(),
            status,
        }
    }

    fn try_process(
        &self,
        path: &Path,
        images: &[ImageRecord],
        output_dir: &Path,
    ) -> zonal_processor::Result<PartitionStatus> {
        let partition = ZonePartition::load(path)?;
        let candidates = match self.aggregator.aoi(&partition) {
            Some(aoi) => filter_by_aoi(images, &aoi),
            None => Vec::new(),
        };

        let (table, result) = self.aggregator.run(&partition, &candidates, output_dir)?;
        Ok(PartitionStatus::Ok {
            table,
            zones: partition.len(),
            rows: result.table.len(),
            images: result.stats.images,
            images_skipped: result.stats.images_skipped,
            entries: result.stats.entries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_serialization() {
        let ok = PartitionOutcome {
            partition: PathBuf::from("zones_1.shp"),
            status: PartitionStatus::Ok {
                table: PathBuf::from("out/zones_1_zonal_stats_for_ml.csv"),
                zones: 2,
                rows: 1,
                images: 3,
                images_skipped: 1,
                entries: 6,
            },
        };
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["partition"], "zones_1.shp");
        assert_eq!(json["rows"], 1);

        let failed = PartitionOutcome {
            partition: PathBuf::from("zones_2.shp"),
            status: PartitionStatus::Failed {
                error: "boom".into(),
            },
        };
        assert!(!failed.is_ok());
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["error"], "boom");
    }
}
