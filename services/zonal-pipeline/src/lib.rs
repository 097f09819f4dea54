//! Zonal statistics pipeline service.
//!
//! Two stages, run separately:
//!
//! ```text
//! extract:   partitions/*.shp ─┐
//!            metadata.csv ─────┼─► ExtractRunner (rayon pool) ─► tables/*_zonal_stats_for_ml.csv
//!            GeoTIFF scenes ───┘         │
//!                                        └─► RunSummary (JSON)
//!
//! reconcile: tables/ + partitions/ + date catalog ─► Reconciler ─► merged CSV
//!                                                       │
//!                                                       └─► ValidationReport
//! ```

pub mod config;
pub mod runner;

pub use config::{PipelineConfig, DEFAULT_DATE_CATALOG};
pub use runner::{ExtractRunner, PartitionOutcome, PartitionStatus, RunSummary};
