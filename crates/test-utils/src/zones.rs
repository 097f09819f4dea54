//! Zone partition shapefile fixtures.

use std::path::Path;

use shapefile::dbase::{FieldName, FieldValue, Record, TableWriterBuilder};
use shapefile::{Point, Polygon, PolygonRing};

/// One zone polygon plus its attribute row.
#[derive(Debug, Clone)]
pub struct ZoneFixture {
    pub gid: i64,
    pub fid_1: i64,
    pub lcgroup: String,
    pub lctype: String,
    /// Closed exterior ring.
    pub ring: Vec<(f64, f64)>,
}

impl ZoneFixture {
    pub fn new(gid: i64, ring: Vec<(f64, f64)>) -> Self {
        Self {
            gid,
            fid_1: gid * 10,
            lcgroup: "Grassland".to_string(),
            lctype: "Improved grassland".to_string(),
            ring,
        }
    }

    pub fn with_landcover(mut self, lcgroup: &str, lctype: &str) -> Self {
        self.lcgroup = lcgroup.to_string();
        self.lctype = lctype.to_string();
        self
    }
}

/// Closed rectangular ring from `(min_x, min_y)` to `(max_x, max_y)`.
pub fn rectangle(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Vec<(f64, f64)> {
    vec![
        (min_x, min_y),
        (min_x, max_y),
        (max_x, max_y),
        (max_x, min_y),
        (min_x, min_y),
    ]
}

/// Attribute name casing; partitions in the wild use both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeCase {
    Upper,
    Lower,
}

impl AttributeCase {
    fn name(&self, upper: &str) -> String {
        match self {
            AttributeCase::Upper => upper.to_string(),
            AttributeCase::Lower => upper.to_lowercase(),
        }
    }
}

fn field_name(name: &str) -> Result<FieldName, Box<dyn std::error::Error>> {
    FieldName::try_from(name).map_err(|e| format!("invalid field name {}: {:?}", name, e).into())
}

/// Write `zones` as a polygon shapefile (plus .dbf/.shx) at `path`.
pub fn write_zone_partition(
    path: &Path,
    zones: &[ZoneFixture],
    case: AttributeCase,
) -> Result<(), Box<dyn std::error::Error>> {
    let gid = case.name("GID");
    let fid_1 = case.name("FID_1");
    let lcgroup = case.name("LCGROUP");
    let lctype = case.name("LCTYPE");

    let table = TableWriterBuilder::new()
        .add_numeric_field(field_name(&gid)?, 10, 0)
        .add_numeric_field(field_name(&fid_1)?, 10, 0)
        .add_character_field(field_name(&lcgroup)?, 50)
        .add_character_field(field_name(&lctype)?, 80);

    let mut writer = shapefile::Writer::from_path(path, table)?;
    for zone in zones {
        let points = zone.ring.iter().map(|&(x, y)| Point::new(x, y)).collect();
        let polygon = Polygon::new(PolygonRing::Outer(points));

        let mut record = Record::default();
        record.insert(gid.clone(), FieldValue::Numeric(Some(zone.gid as f64)));
        record.insert(fid_1.clone(), FieldValue::Numeric(Some(zone.fid_1 as f64)));
        record.insert(lcgroup.clone(), FieldValue::Character(Some(zone.lcgroup.clone())));
        record.insert(lctype.clone(), FieldValue::Character(Some(zone.lctype.clone())));

        writer.write_shape_and_record(&polygon, &record)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_zone_partition() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zones_7.shp");
        let zones = vec![
            ZoneFixture::new(1, rectangle(0.0, 0.0, 10.0, 10.0)),
            ZoneFixture::new(2, rectangle(20.0, 0.0, 30.0, 10.0)),
        ];

        write_zone_partition(&path, &zones, AttributeCase::Lower).unwrap();

        let shapes = shapefile::read_shapes_as::<_, Polygon>(&path).unwrap();
        assert_eq!(shapes.len(), 2);
        assert!(dir.path().join("zones_7.dbf").exists());
    }
}
