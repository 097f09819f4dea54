//! Image footprints stored as hex-encoded WKB.
//!
//! Catalogs exported from PostGIS carry EWKB (optional SRID, Z/M flags);
//! plain ISO WKB is accepted too. Only polygonal footprints are meaningful,
//! anything else is rejected.

use bytes::Buf;
use geo::{Coord, LineString, MultiPolygon, Polygon};

use crate::error::{Result, ZonalError};

const WKB_POLYGON: u32 = 3;
const WKB_MULTIPOLYGON: u32 = 6;

// EWKB flag bits
const EWKB_Z: u32 = 0x8000_0000;
const EWKB_M: u32 = 0x4000_0000;
const EWKB_SRID: u32 = 0x2000_0000;

/// Decode a hex WKB polygon or multipolygon.
pub fn parse_hex_footprint(hex_wkb: &str) -> Result<MultiPolygon<f64>> {
    let bytes = hex::decode(hex_wkb.trim())
        .map_err(|e| ZonalError::footprint(format!("not hex: {}", e)))?;
    let mut reader = WkbReader { buf: &bytes[..] };
    let geometry = reader.geometry()?;
    if reader.buf.has_remaining() {
        return Err(ZonalError::footprint(format!(
            "{} trailing bytes",
            reader.buf.remaining()
        )));
    }
    Ok(geometry)
}

struct WkbReader<'a> {
    buf: &'a [u8],
}

/// Byte order and coordinate width of one geometry header.
#[derive(Clone, Copy)]
struct Layout {
    little_endian: bool,
    dims: usize,
}

impl<'a> WkbReader<'a> {
    fn need(&self, n: usize) -> Result<()> {
        if self.buf.remaining() < n {
            return Err(ZonalError::footprint("unexpected end of WKB"));
        }
        Ok(())
    }

    fn u32(&mut self, layout: Layout) -> Result<u32> {
        self.need(4)?;
        Ok(if layout.little_endian {
            self.buf.get_u32_le()
        } else {
            self.buf.get_u32()
        })
    }

    fn f64(&mut self, layout: Layout) -> Result<f64> {
        self.need(8)?;
        Ok(if layout.little_endian {
            self.buf.get_f64_le()
        } else {
            self.buf.get_f64()
        })
    }

    /// Read byte order and type; returns (base type, layout).
    fn header(&mut self) -> Result<(u32, Layout)> {
        self.need(1)?;
        let little_endian = match self.buf.get_u8() {
            0 => false,
            1 => true,
            other => return Err(ZonalError::footprint(format!("bad byte order {}", other))),
        };
        let mut layout = Layout {
            little_endian,
            dims: 2,
        };

        let raw = self.u32(layout)?;
        if raw & EWKB_SRID != 0 {
            self.u32(layout)?;
        }
        let mut dims = 2;
        if raw & EWKB_Z != 0 {
            dims += 1;
        }
        if raw & EWKB_M != 0 {
            dims += 1;
        }

        // ISO WKB encodes Z/M as 1000/2000/3000 offsets
        let code = raw & 0x0FFF_FFFF;
        let base = code % 1000;
        dims += match code / 1000 {
            1 | 2 => 1,
            3 => 2,
            _ => 0,
        };
        layout.dims = dims;
        Ok((base, layout))
    }

    fn geometry(&mut self) -> Result<MultiPolygon<f64>> {
        let (base, layout) = self.header()?;
        match base {
            WKB_POLYGON => Ok(MultiPolygon::new(vec![self.polygon_body(layout)?])),
            WKB_MULTIPOLYGON => {
                let count = self.u32(layout)?;
                let mut polygons = Vec::new();
                for _ in 0..count {
                    let (inner, inner_layout) = self.header()?;
                    if inner != WKB_POLYGON {
                        return Err(ZonalError::footprint(format!(
                            "multipolygon member of type {}",
                            inner
                        )));
                    }
                    polygons.push(self.polygon_body(inner_layout)?);
                }
                Ok(MultiPolygon::new(polygons))
            }
            other => Err(ZonalError::footprint(format!(
                "geometry type {} is not polygonal",
                other
            ))),
        }
    }

    fn polygon_body(&mut self, layout: Layout) -> Result<Polygon<f64>> {
        let ring_count = self.u32(layout)?;
        let mut rings = Vec::new();
        for _ in 0..ring_count {
            let point_count = self.u32(layout)? as usize;
            self.need(point_count.saturating_mul(layout.dims * 8))?;
            let mut coords = Vec::with_capacity(point_count);
            for _ in 0..point_count {
                let x = self.f64(layout)?;
                let y = self.f64(layout)?;
                for _ in 2..layout.dims {
                    self.f64(layout)?;
                }
                coords.push(Coord { x, y });
            }
            rings.push(LineString::new(coords));
        }

        let mut rings = rings.into_iter();
        let exterior = rings
            .next()
            .ok_or_else(|| ZonalError::footprint("polygon without rings"))?;
        Ok(Polygon::new(exterior, rings.collect()))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use geo::Area;

    /// Little-endian hex WKB for a single-ring polygon.
    pub(crate) fn polygon_hex(ring: &[(f64, f64)]) -> String {
        let mut bytes = vec![1u8];
        bytes.extend_from_slice(&WKB_POLYGON.to_le_bytes());
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(&(ring.len() as u32).to_le_bytes());
        for (x, y) in ring {
            bytes.extend_from_slice(&x.to_le_bytes());
            bytes.extend_from_slice(&y.to_le_bytes());
        }
        hex::encode_upper(bytes)
    }

    #[test]
    fn test_parse_polygon() {
        let ring = [(0.0, 0.0), (0.0, 10.0), (20.0, 10.0), (20.0, 0.0), (0.0, 0.0)];
        let footprint = parse_hex_footprint(&polygon_hex(&ring)).unwrap();
        assert_eq!(footprint.0.len(), 1);
        assert_eq!(footprint.unsigned_area(), 200.0);
    }

    #[test]
    fn test_parse_big_endian_ewkb_with_srid() {
        // Polygon with SRID 27700, big-endian
        let mut bytes = vec![0u8];
        bytes.extend_from_slice(&(WKB_POLYGON | EWKB_SRID).to_be_bytes());
        bytes.extend_from_slice(&27700u32.to_be_bytes());
        bytes.extend_from_slice(&1u32.to_be_bytes());
        bytes.extend_from_slice(&4u32.to_be_bytes());
        for (x, y) in [(0.0f64, 0.0f64), (0.0, 4.0), (4.0, 0.0), (0.0, 0.0)] {
            bytes.extend_from_slice(&x.to_be_bytes());
            bytes.extend_from_slice(&y.to_be_bytes());
        }

        let footprint = parse_hex_footprint(&hex::encode(bytes)).unwrap();
        assert_eq!(footprint.unsigned_area(), 8.0);
    }

    #[test]
    fn test_rejects_point_and_truncated() {
        let mut point = vec![1u8];
        point.extend_from_slice(&1u32.to_le_bytes());
        point.extend_from_slice(&1.0f64.to_le_bytes());
        point.extend_from_slice(&2.0f64.to_le_bytes());
        assert!(parse_hex_footprint(&hex::encode(point)).is_err());

        let ring = [(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (0.0, 0.0)];
        let full = polygon_hex(&ring);
        assert!(parse_hex_footprint(&full[..full.len() - 4]).is_err());
        assert!(parse_hex_footprint("not hex").is_err());
    }
}
