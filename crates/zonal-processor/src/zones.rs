//! Zone polygons and their loading from shapefile partitions.
//!
//! A partition is one shapefile of land-cover zones. Attributes are read
//! case-insensitively in the two spellings found in practice (`GID` and
//! `gid`); geometry is validated ring by ring before it is used.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use geo::{Area, BoundingRect, Coord, LineString, MultiPolygon, Polygon};
use shapefile::dbase::{FieldValue, Record};
use shapefile::{PolygonRing, Shape};
use tracing::{debug, warn};
use zonal_common::BoundingBox;

use crate::error::{Result, ZonalError};

const FIELD_GID: &str = "GID";
const FIELD_FID_1: &str = "FID_1";
const FIELD_LCGROUP: &str = "LCGROUP";
const FIELD_LCTYPE: &str = "LCTYPE";

/// A ring as read from the source, before validation.
#[derive(Debug, Clone, PartialEq)]
pub enum Ring {
    Outer(Vec<(f64, f64)>),
    Inner(Vec<(f64, f64)>),
}

/// One land-cover zone.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneDescriptor {
    /// Zone id, unique within its partition.
    pub id: i64,
    pub fid_1: i64,
    pub lcgroup: String,
    pub lctype: String,
    pub geometry: MultiPolygon<f64>,
    /// Planar area in map units squared.
    pub area: f64,
    bounds: BoundingBox,
}

impl ZoneDescriptor {
    /// Create a zone, checking the geometry and deriving area and bounds.
    pub fn new(
        id: i64,
        fid_1: i64,
        lcgroup: impl Into<String>,
        lctype: impl Into<String>,
        geometry: MultiPolygon<f64>,
    ) -> Result<Self> {
        for polygon in &geometry {
            check_line_string(id, polygon.exterior())?;
            for interior in polygon.interiors() {
                check_line_string(id, interior)?;
            }
        }

        let rect = geometry
            .bounding_rect()
            .ok_or_else(|| ZonalError::geometry(id, "geometry has no polygons"))?;
        let bounds = BoundingBox::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y);

        Ok(Self {
            id,
            fid_1,
            lcgroup: lcgroup.into(),
            lctype: lctype.into(),
            area: geometry.unsigned_area(),
            geometry,
            bounds,
        })
    }

    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }
}

/// Build polygons from raw rings. Each outer ring starts a polygon; inner
/// rings are holes of the outer ring before them.
///
/// Rings must have at least four positions, be closed and have finite
/// coordinates.
pub fn polygons_from_rings(zone: i64, rings: Vec<Ring>) -> Result<MultiPolygon<f64>> {
    let mut polygons: Vec<(LineString<f64>, Vec<LineString<f64>>)> = Vec::new();

    for ring in rings {
        match ring {
            Ring::Outer(points) => {
                check_ring(zone, &points)?;
                polygons.push((LineString::from(points), Vec::new()));
            }
            Ring::Inner(points) => {
                check_ring(zone, &points)?;
                let (_, holes) = polygons
                    .last_mut()
                    .ok_or_else(|| ZonalError::geometry(zone, "inner ring before any outer ring"))?;
                holes.push(LineString::from(points));
            }
        }
    }

    if polygons.is_empty() {
        return Err(ZonalError::geometry(zone, "no rings"));
    }

    Ok(MultiPolygon::new(
        polygons
            .into_iter()
            .map(|(exterior, holes)| Polygon::new(exterior, holes))
            .collect(),
    ))
}

fn check_ring(zone: i64, points: &[(f64, f64)]) -> Result<()> {
    if points.len() < 4 {
        return Err(ZonalError::geometry(
            zone,
            format!("ring has {} positions, need at least 4", points.len()),
        ));
    }
    if points.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
        return Err(ZonalError::geometry(zone, "non-finite coordinate"));
    }
    if points.first() != points.last() {
        return Err(ZonalError::geometry(zone, "ring is not closed"));
    }
    Ok(())
}

fn check_line_string(zone: i64, ring: &LineString<f64>) -> Result<()> {
    let points: Vec<(f64, f64)> = ring.coords().map(|c: &Coord<f64>| (c.x, c.y)).collect();
    check_ring(zone, &points)
}

/// All zones of one partition, ordered by zone id.
#[derive(Debug, Clone)]
pub struct ZonePartition {
    path: PathBuf,
    zones: Vec<ZoneDescriptor>,
}

impl ZonePartition {
    pub fn new(path: impl Into<PathBuf>, mut zones: Vec<ZoneDescriptor>) -> Self {
        zones.sort_by_key(|z| z.id);
        Self {
            path: path.into(),
            zones,
        }
    }

    /// Read every polygon feature of a shapefile.
    ///
    /// A zone id seen twice keeps the later feature.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(ZonalError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("zone partition {} not found", path.display()),
            )));
        }

        let mut reader =
            shapefile::Reader::from_path(path).map_err(|e| ZonalError::zone_partition(path, e))?;

        let mut zones: BTreeMap<i64, ZoneDescriptor> = BTreeMap::new();
        for (feature, result) in reader.iter_shapes_and_records().enumerate() {
            let (shape, record) = result.map_err(|e| ZonalError::zone_partition(path, e))?;

            let id = integer_attribute(path, &record, FIELD_GID)?;
            let fid_1 = integer_attribute(path, &record, FIELD_FID_1)?;
            let lcgroup = text_attribute(path, &record, FIELD_LCGROUP)?;
            let lctype = text_attribute(path, &record, FIELD_LCTYPE)?;

            let rings = match shape {
                Shape::Polygon(p) => convert_rings(p.rings(), |pt| (pt.x, pt.y)),
                Shape::PolygonM(p) => convert_rings(p.rings(), |pt| (pt.x, pt.y)),
                Shape::PolygonZ(p) => convert_rings(p.rings(), |pt| (pt.x, pt.y)),
                Shape::NullShape => {
                    return Err(ZonalError::geometry(id, "feature has no geometry"));
                }
                other => {
                    return Err(ZonalError::zone_partition(
                        path,
                        format!("feature {} is a {:?}, not a polygon", feature, other.shapetype()),
                    ));
                }
            };

            let zone = ZoneDescriptor::new(id, fid_1, lcgroup, lctype, polygons_from_rings(id, rings)?)?;
            if zones.insert(id, zone).is_some() {
                warn!(path = %path.display(), zone = id, "Duplicate zone id, keeping later feature");
            }
        }

        debug!(path = %path.display(), zones = zones.len(), "Loaded zone partition");

        Ok(Self {
            path: path.to_path_buf(),
            zones: zones.into_values().collect(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File stem, used to name the partition's table.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn zones(&self) -> &[ZoneDescriptor] {
        &self.zones
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Union of all zone bounds, `None` for an empty partition.
    pub fn extent(&self) -> Option<BoundingBox> {
        self.zones
            .iter()
            .map(|z| z.bounds())
            .reduce(|acc, b| acc.union(&b))
    }
}

fn convert_rings<P>(rings: &[PolygonRing<P>], xy: impl Fn(&P) -> (f64, f64)) -> Vec<Ring> {
    rings
        .iter()
        .map(|ring| match ring {
            PolygonRing::Outer(points) => Ring::Outer(points.iter().map(&xy).collect()),
            PolygonRing::Inner(points) => Ring::Inner(points.iter().map(&xy).collect()),
        })
        .collect()
}

fn attribute<'a>(path: &Path, record: &'a Record, field: &str) -> Result<&'a FieldValue> {
    record
        .get(field)
        .or_else(|| record.get(&field.to_lowercase()))
        .ok_or_else(|| ZonalError::zone_attribute(path, field, "is missing"))
}

fn integer_attribute(path: &Path, record: &Record, field: &str) -> Result<i64> {
    let value = match attribute(path, record, field)? {
        FieldValue::Numeric(Some(v)) | FieldValue::Double(v) => Some(*v),
        FieldValue::Float(Some(v)) => Some(f64::from(*v)),
        FieldValue::Integer(v) => Some(f64::from(*v)),
        FieldValue::Character(Some(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match value {
        Some(v) if v.is_finite() && v.fract() == 0.0 => Ok(v as i64),
        _ => Err(ZonalError::zone_attribute(path, field, "is not an integer")),
    }
}

fn text_attribute(path: &Path, record: &Record, field: &str) -> Result<String> {
    let text = match attribute(path, record, field)? {
        FieldValue::Character(Some(s)) | FieldValue::Memo(s) => s.trim().to_string(),
        FieldValue::Character(None) => String::new(),
        FieldValue::Numeric(Some(v)) | FieldValue::Double(v) => v.to_string(),
        FieldValue::Integer(v) => v.to_string(),
        _ => return Err(ZonalError::zone_attribute(path, field, "is not text")),
    };
    Ok(text)
}
