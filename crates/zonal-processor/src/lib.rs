//! Zonal statistics for one zone partition.
//!
//! A partition is a shapefile of land-cover zones. Every image of the time
//! series is read over the partition's buffered extent, and each zone gets
//! mean, range and population variance per band and acquisition date.
//!
//! # Architecture
//!
//! ```text
//! ZonePartition::load(shp)      load_image_records(csv) ─► filter_by_aoi
//!          │                              │
//!          └──────────────┬───────────────┘
//!                         ▼
//!         PartitionAggregator::aggregate
//!                         │
//!     for image: WindowExtractor::extract (each band; skip if nodata)
//!     for zone:  StatisticCalculator::compute ─► DegeneracyPolicy
//!                         │
//!                         ▼
//!          StatisticTable (zone → band → date)
//!                         │
//!                         ▼
//!          PartitionTable::build ─► write_csv
//! ```

pub mod accumulator;
pub mod aggregator;
pub mod config;
pub mod degeneracy;
pub mod error;
pub mod footprint;
pub mod imagery;
pub mod stats;
pub mod table;
pub mod zones;

pub use accumulator::{StatisticTable, ZonalStatisticEntry};
pub use aggregator::{AggregationStats, PartitionAggregator, PartitionResult};
pub use config::{AggregatorConfig, DEFAULT_OUTPUT_SUFFIX};
pub use degeneracy::{DegeneracyPolicy, EmptyOrAllZero};
pub use error::{Result, ZonalError};
pub use footprint::parse_hex_footprint;
pub use imagery::{filter_by_aoi, load_image_records, ImageRecord};
pub use stats::{population_variance, StatisticCalculator, VarianceFn, ZoneStatistics};
pub use table::PartitionTable;
pub use zones::{polygons_from_rings, Ring, ZoneDescriptor, ZonePartition};
