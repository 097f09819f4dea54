//! Per-partition aggregation.
//!
//! For every image the partition AOI is read once per band. An image is
//! used only if every band window has data; each zone then gets one entry
//! per band unless its statistics are degenerate.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDate;
use raster_io::{AoiWindow, WindowExtractor};
use tracing::{debug, info, warn};
use zonal_common::{Band, BoundingBox};

use crate::accumulator::{StatisticTable, ZonalStatisticEntry};
use crate::config::AggregatorConfig;
use crate::degeneracy::{DegeneracyPolicy, EmptyOrAllZero};
use crate::error::Result;
use crate::imagery::ImageRecord;
use crate::stats::StatisticCalculator;
use crate::table::PartitionTable;
use crate::zones::ZonePartition;

/// Counters for one aggregation, for logs and run summaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregationStats {
    pub images: usize,
    pub images_skipped: usize,
    pub entries: usize,
    pub degenerate: usize,
    pub duplicates: usize,
}

/// Output of [`PartitionAggregator::aggregate`].
#[derive(Debug, Clone)]
pub struct PartitionResult {
    pub table: PartitionTable,
    pub stats: AggregationStats,
}

/// Drives window extraction and zone statistics over one partition.
#[derive(Clone)]
pub struct PartitionAggregator {
    config: AggregatorConfig,
    extractor: WindowExtractor,
    calculator: StatisticCalculator,
    degeneracy: Arc<dyn DegeneracyPolicy>,
}

impl PartitionAggregator {
    pub fn new(config: AggregatorConfig, extractor: WindowExtractor) -> Self {
        Self {
            config,
            extractor,
            calculator: StatisticCalculator::default(),
            degeneracy: Arc::new(EmptyOrAllZero),
        }
    }

    pub fn with_calculator(mut self, calculator: StatisticCalculator) -> Self {
        self.calculator = calculator;
        self
    }

    pub fn with_degeneracy(mut self, policy: Arc<dyn DegeneracyPolicy>) -> Self {
        self.degeneracy = policy;
        self
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Zone extent grown by the buffer distance.
    pub fn aoi(&self, partition: &ZonePartition) -> Option<BoundingBox> {
        partition
            .extent()
            .map(|extent| extent.buffer(self.config.buffer_distance))
    }

    /// Table path for `partition` inside `output_dir`.
    pub fn output_path(&self, partition: &ZonePartition, output_dir: &Path) -> PathBuf {
        output_dir.join(format!("{}{}", partition.stem(), self.config.output_suffix))
    }

    /// Build the partition table in memory.
    ///
    /// Header dates are every distinct acquisition date of `images`, whether
    /// or not the image ends up contributing. A missing or unreadable image
    /// fails the whole partition.
    pub fn aggregate(
        &self,
        partition: &ZonePartition,
        images: &[ImageRecord],
    ) -> Result<PartitionResult> {
        let start = Instant::now();
        let bands = &self.config.bands;

        let mut dated = Vec::with_capacity(images.len());
        for image in images {
            dated.push((image, image.date()?));
        }
        let dates: Vec<NaiveDate> = dated
            .iter()
            .map(|(_, date)| *date)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut stats = AggregationStats::default();
        let mut entries = StatisticTable::new();

        match self.aoi(partition) {
            None => {
                warn!(partition = %partition.path().display(), "Partition has no zones");
            }
            Some(aoi) => {
                for (image, date) in dated {
                    let Some(windows) = self.read_bands(image, bands, &aoi)? else {
                        stats.images_skipped += 1;
                        continue;
                    };
                    stats.images += 1;
                    self.accumulate(partition, date, &windows, &mut entries, &mut stats)?;
                }
            }
        }

        stats.entries = entries.len();
        let table = PartitionTable::build(partition.zones(), bands, &dates, &entries);

        info!(
            partition = %partition.path().display(),
            zones = partition.len(),
            rows = table.len(),
            images = stats.images,
            skipped = stats.images_skipped,
            entries = stats.entries,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Aggregated partition"
        );

        Ok(PartitionResult { table, stats })
    }

    /// Read the AOI on every band, or `None` when any band has no data.
    ///
    /// Every band is read before the nodata check, so a bad band index or
    /// an unreadable plane fails the partition even on a skipped image.
    fn read_bands<'b>(
        &self,
        image: &ImageRecord,
        bands: &'b [Band],
        aoi: &BoundingBox,
    ) -> Result<Option<Vec<(&'b Band, AoiWindow)>>> {
        let mut windows = Vec::with_capacity(bands.len());
        for band in bands {
            let window = self.extractor.extract(&image.path, band.index, aoi)?;
            windows.push((band, window));
        }

        if let Some((band, _)) = windows.iter().find(|(_, window)| window.all_nodata) {
            warn!(
                image = %image.path.display(),
                band = %band.name,
                policy = self.extractor.policy().name(),
                "Window has no data, skipping image"
            );
            return Ok(None);
        }
        Ok(Some(windows))
    }

    fn accumulate(
        &self,
        partition: &ZonePartition,
        date: NaiveDate,
        windows: &[(&Band, AoiWindow)],
        entries: &mut StatisticTable,
        stats: &mut AggregationStats,
    ) -> Result<()> {
        for zone in partition.zones() {
            for (band, window) in windows {
                let zone_stats = self
                    .calculator
                    .compute(&window.data, &window.transform, zone)?;

                if self.degeneracy.is_degenerate(&zone_stats) {
                    stats.degenerate += 1;
                    continue;
                }
                let Some(entry) =
                    ZonalStatisticEntry::from_statistics(zone.id, band.index, date, &zone_stats)
                else {
                    stats.degenerate += 1;
                    continue;
                };

                if entries.insert(entry).is_some() {
                    stats.duplicates += 1;
                    debug!(zone = zone.id, band = %band.name, %date, "Replaced duplicate entry");
                }
            }
        }
        Ok(())
    }

    /// Aggregate and write the table to `output_dir`. Nothing is written if
    /// aggregation fails.
    pub fn run(
        &self,
        partition: &ZonePartition,
        images: &[ImageRecord],
        output_dir: &Path,
    ) -> Result<(PathBuf, PartitionResult)> {
        let result = self.aggregate(partition, images)?;
        let path = self.output_path(partition, output_dir);
        result.table.write_csv(&path)?;
        debug!(path = %path.display(), rows = result.table.len(), "Wrote partition table");
        Ok((path, result))
    }
}

impl std::fmt::Debug for PartitionAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PartitionAggregator")
            .field("config", &self.config)
            .field("extractor", &self.extractor)
            .field("degeneracy", &self.degeneracy.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ZonalError;
    use crate::zones::{polygons_from_rings, Ring, ZoneDescriptor};
    use raster_io::{MemoryRaster, MemoryRasterStore};
    use zonal_common::GeoTransform;

    fn square_zone(id: i64, x: f64, y: f64, size: f64) -> ZoneDescriptor {
        let ring = vec![(x, y), (x, y + size), (x + size, y + size), (x + size, y), (x, y)];
        ZoneDescriptor::new(id, id, "Arable", "Barley", polygons_from_rings(id, vec![Ring::Outer(ring)]).unwrap())
            .unwrap()
    }

    // 10x10 raster of 1 m pixels covering (0, 0)-(10, 10)
    fn raster(value: f64) -> MemoryRaster {
        MemoryRaster::filled(10, 10, GeoTransform::north_up(0.0, 10.0, 1.0, 1.0), 2, value)
    }

    fn aggregator(store: MemoryRasterStore) -> PartitionAggregator {
        PartitionAggregator::new(
            AggregatorConfig::default(),
            WindowExtractor::new(Arc::new(store)),
        )
    }

    #[test]
    fn test_constant_window_is_kept() {
        let mut store = MemoryRasterStore::new();
        store.insert("a.tif", raster(5.0));
        let partition = ZonePartition::new("zones_1.shp", vec![square_zone(1, 0.0, 0.0, 10.0)]);

        let result = aggregator(store)
            .aggregate(&partition, &[ImageRecord::new("a.tif", 5, 1, 2020)])
            .unwrap();

        assert_eq!(result.table.len(), 1);
        let row = &result.table.rows()[0];
        assert_eq!(&row[5..], &["5", "0", "0", "5", "0", "0"]);
        assert_eq!(result.stats.entries, 2);
    }

    #[test]
    fn test_zone_outside_window_has_no_row() {
        let mut store = MemoryRasterStore::new();
        store.insert("a.tif", raster(5.0));
        let partition = ZonePartition::new(
            "zones_1.shp",
            vec![square_zone(1, 0.0, 0.0, 10.0), square_zone(2, 50.0, 50.0, 10.0)],
        );

        let result = aggregator(store)
            .aggregate(&partition, &[ImageRecord::new("a.tif", 5, 1, 2020)])
            .unwrap();

        assert_eq!(result.table.len(), 1);
        assert_eq!(result.table.rows()[0][0], "1");
        assert_eq!(result.stats.degenerate, 2);
    }

    #[test]
    fn test_nodata_image_skipped_but_dated() {
        let mut store = MemoryRasterStore::new();
        store.insert("a.tif", raster(5.0));
        store.insert("b.tif", raster(0.0));
        let partition = ZonePartition::new("zones_1.shp", vec![square_zone(1, 0.0, 0.0, 10.0)]);

        let result = aggregator(store)
            .aggregate(
                &partition,
                &[
                    ImageRecord::new("b.tif", 17, 1, 2020),
                    ImageRecord::new("a.tif", 5, 1, 2020),
                ],
            )
            .unwrap();

        assert_eq!(result.stats.images, 1);
        assert_eq!(result.stats.images_skipped, 1);
        let header = result.table.header();
        assert_eq!(header.len(), 5 + 2 * 2 * 3);
        assert_eq!(header[5], "2020-01-05_VV_mean");
        assert_eq!(header[8], "2020-01-17_VV_mean");
        let row = &result.table.rows()[0];
        assert_eq!(row[5], "5");
        assert_eq!(row[8], "");
    }

    #[test]
    fn test_every_band_read_before_nodata_skip() {
        // One band only: VV is empty, VH does not exist
        let mut store = MemoryRasterStore::new();
        store.insert(
            "a.tif",
            MemoryRaster::filled(10, 10, GeoTransform::north_up(0.0, 10.0, 1.0, 1.0), 1, 0.0),
        );
        let partition = ZonePartition::new("zones_1.shp", vec![square_zone(1, 0.0, 0.0, 10.0)]);

        let err = aggregator(store)
            .aggregate(&partition, &[ImageRecord::new("a.tif", 5, 1, 2020)])
            .unwrap_err();
        assert!(matches!(
            err,
            ZonalError::Raster(raster_io::RasterError::BandOutOfRange { band: 2, count: 1 })
        ));
    }

    #[test]
    fn test_missing_image_fails_partition() {
        let partition = ZonePartition::new("zones_1.shp", vec![square_zone(1, 0.0, 0.0, 10.0)]);
        let err = aggregator(MemoryRasterStore::new())
            .aggregate(&partition, &[ImageRecord::new("gone.tif", 5, 1, 2020)])
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_invalid_date_fails_partition() {
        let mut store = MemoryRasterStore::new();
        store.insert("a.tif", raster(5.0));
        let partition = ZonePartition::new("zones_1.shp", vec![square_zone(1, 0.0, 0.0, 10.0)]);
        let err = aggregator(store)
            .aggregate(&partition, &[ImageRecord::new("a.tif", 31, 4, 2020)])
            .unwrap_err();
        assert!(matches!(err, ZonalError::Common(_)));
    }

    #[test]
    fn test_same_date_overwrites() {
        let mut store = MemoryRasterStore::new();
        store.insert("a.tif", raster(5.0));
        store.insert("b.tif", raster(7.0));
        let partition = ZonePartition::new("zones_1.shp", vec![square_zone(1, 0.0, 0.0, 10.0)]);

        let result = aggregator(store)
            .aggregate(
                &partition,
                &[
                    ImageRecord::new("a.tif", 5, 1, 2020),
                    ImageRecord::new("b.tif", 5, 1, 2020),
                ],
            )
            .unwrap();

        assert_eq!(result.stats.duplicates, 2);
        assert_eq!(result.table.rows()[0][5], "7");
    }

    #[test]
    fn test_output_path() {
        let partition = ZonePartition::new("/data/zones/zones_0042.shp", Vec::new());
        let path = aggregator(MemoryRasterStore::new()).output_path(&partition, Path::new("/out"));
        assert_eq!(path, PathBuf::from("/out/zones_0042_zonal_stats_for_ml.csv"));
    }
}
