//! Small GeoTIFF scenes for raster reader tests.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use tiff::encoder::colortype::{Gray32Float, RGB32Float};
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;
use zonal_common::GeoTransform;

// GeoTIFF Tag IDs (not in standard tiff crate)
const GEOTIFF_MODELPIXELSCALE: u16 = 33550;
const GEOTIFF_MODELTIEPOINT: u16 = 33922;

/// Layout of a north-up test scene.
#[derive(Debug, Clone, Copy)]
pub struct SceneSpec {
    pub width: usize,
    pub height: usize,
    /// Upper-left corner.
    pub origin_x: f64,
    pub origin_y: f64,
    /// Square pixel size in map units.
    pub pixel_size: f64,
    /// Forces several strips so reads cross chunk boundaries.
    pub rows_per_strip: Option<u32>,
}

impl SceneSpec {
    pub fn new(width: usize, height: usize, origin_x: f64, origin_y: f64, pixel_size: f64) -> Self {
        Self {
            width,
            height,
            origin_x,
            origin_y,
            pixel_size,
            rows_per_strip: None,
        }
    }

    pub fn with_rows_per_strip(mut self, rows: u32) -> Self {
        self.rows_per_strip = Some(rows);
        self
    }

    pub fn transform(&self) -> GeoTransform {
        GeoTransform::north_up(self.origin_x, self.origin_y, self.pixel_size, self.pixel_size)
    }
}

/// Write a float32 GeoTIFF with 1, 2 or 3 bands.
///
/// Two-band scenes are stored as three samples with an all-zero third band,
/// matching how the RGB colour type lays out interleaved data.
pub fn write_geotiff(
    path: &Path,
    scene: &SceneSpec,
    bands: &[Vec<f32>],
) -> Result<(), Box<dyn std::error::Error>> {
    let pixels = scene.width * scene.height;
    if bands.is_empty() || bands.len() > 3 || bands.iter().any(|b| b.len() != pixels) {
        return Err(format!(
            "expected 1-3 bands of {} values, got {} band(s)",
            pixels,
            bands.len()
        )
        .into());
    }

    let file = BufWriter::new(File::create(path)?);
    let mut encoder = TiffEncoder::new(file)?;
    let (width, height) = (scene.width as u32, scene.height as u32);

    let pixel_scale = [scene.pixel_size, scene.pixel_size, 0.0];
    // Ties pixel (0, 0) to the upper-left corner
    let tiepoint = [0.0, 0.0, 0.0, scene.origin_x, scene.origin_y, 0.0];

    if bands.len() == 1 {
        let mut image = encoder.new_image::<Gray32Float>(width, height)?;
        if let Some(rows) = scene.rows_per_strip {
            image.rows_per_strip(rows)?;
        }
        image
            .encoder()
            .write_tag(Tag::Unknown(GEOTIFF_MODELPIXELSCALE), pixel_scale.as_slice())?;
        image
            .encoder()
            .write_tag(Tag::Unknown(GEOTIFF_MODELTIEPOINT), tiepoint.as_slice())?;
        image.write_data(&bands[0])?;
    } else {
        let zeros = vec![0.0f32; pixels];
        let third = bands.get(2).unwrap_or(&zeros);
        let mut interleaved = Vec::with_capacity(pixels * 3);
        for i in 0..pixels {
            interleaved.push(bands[0][i]);
            interleaved.push(bands[1][i]);
            interleaved.push(third[i]);
        }

        let mut image = encoder.new_image::<RGB32Float>(width, height)?;
        if let Some(rows) = scene.rows_per_strip {
            image.rows_per_strip(rows)?;
        }
        image
            .encoder()
            .write_tag(Tag::Unknown(GEOTIFF_MODELPIXELSCALE), pixel_scale.as_slice())?;
        image
            .encoder()
            .write_tag(Tag::Unknown(GEOTIFF_MODELTIEPOINT), tiepoint.as_slice())?;
        image.write_data(&interleaved)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::constant_band;

    #[test]
    fn test_write_geotiff() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.tif");
        let scene = SceneSpec::new(8, 6, 0.0, 60.0, 10.0);

        write_geotiff(&path, &scene, &[constant_band(8, 6, 1.0), constant_band(8, 6, 2.0)]).unwrap();

        let mut decoder = tiff::decoder::Decoder::new(File::open(&path).unwrap()).unwrap();
        assert_eq!(decoder.dimensions().unwrap(), (8, 6));
    }

    #[test]
    fn test_rejects_wrong_band_length() {
        let dir = tempfile::tempdir().unwrap();
        let scene = SceneSpec::new(4, 4, 0.0, 4.0, 1.0);
        assert!(write_geotiff(&dir.path().join("bad.tif"), &scene, &[vec![0.0; 3]]).is_err());
    }
}
