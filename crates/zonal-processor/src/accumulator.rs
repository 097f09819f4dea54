//! Sparse zone → band → date accumulation of statistics.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use zonal_common::Statistic;

use crate::stats::ZoneStatistics;

/// Statistics of one zone, band and acquisition date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZonalStatisticEntry {
    pub zone: i64,
    pub band: usize,
    pub date: NaiveDate,
    pub mean: f64,
    pub range: f64,
    pub variance: f64,
}

impl ZonalStatisticEntry {
    /// Entry from computed statistics, `None` if any value is missing.
    pub fn from_statistics(
        zone: i64,
        band: usize,
        date: NaiveDate,
        stats: &ZoneStatistics,
    ) -> Option<Self> {
        Some(Self {
            zone,
            band,
            date,
            mean: stats.mean?,
            range: stats.range?,
            variance: stats.variance?,
        })
    }

    pub fn value(&self, stat: Statistic) -> f64 {
        match stat {
            Statistic::Mean => self.mean,
            Statistic::Range => self.range,
            Statistic::Variance => self.variance,
        }
    }
}

type DateMap = BTreeMap<NaiveDate, ZonalStatisticEntry>;

/// All entries produced for one partition. Owned by a single aggregation.
#[derive(Debug, Clone, Default)]
pub struct StatisticTable {
    zones: BTreeMap<i64, BTreeMap<usize, DateMap>>,
    len: usize,
}

impl StatisticTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry; a previous entry for the same (zone, band, date) is
    /// replaced and returned.
    pub fn insert(&mut self, entry: ZonalStatisticEntry) -> Option<ZonalStatisticEntry> {
        let previous = self
            .zones
            .entry(entry.zone)
            .or_default()
            .entry(entry.band)
            .or_default()
            .insert(entry.date, entry);
        if previous.is_none() {
            self.len += 1;
        }
        previous
    }

    pub fn get(&self, zone: i64, band: usize, date: NaiveDate) -> Option<&ZonalStatisticEntry> {
        self.zones.get(&zone)?.get(&band)?.get(&date)
    }

    pub fn contains_zone(&self, zone: i64) -> bool {
        self.zones.contains_key(&zone)
    }

    /// Zones with at least one entry, ascending.
    pub fn zone_ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.zones.keys().copied()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
