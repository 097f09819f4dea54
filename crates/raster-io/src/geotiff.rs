//! GeoTIFF backend built on the `tiff` decoder.
//!
//! Only the strips or tiles that intersect a requested window are decoded.
//! Georeferencing comes from either `ModelTransformationTag` or the
//! `ModelPixelScaleTag` + `ModelTiepointTag` pair.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::tags::Tag;
use tracing::debug;
use zonal_common::GeoTransform;

use crate::dataset::{PixelWindow, RasterDataset, RasterOpener};
use crate::error::{RasterError, Result};

// GeoTIFF tag IDs
const GEOTIFF_MODELPIXELSCALE: u16 = 33550;
const GEOTIFF_MODELTIEPOINT: u16 = 33922;
const GEOTIFF_MODELTRANSFORMATION: u16 = 34264;

const PLANAR_CONFIG_SEPARATE: u16 = 2;

/// Opens GeoTIFF files from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoTiffOpener;

impl RasterOpener for GeoTiffOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn RasterDataset>> {
        Ok(Box::new(GeoTiffDataset::open(path)?))
    }
}

/// An open GeoTIFF. The file handle is closed when this is dropped.
pub struct GeoTiffDataset {
    path: PathBuf,
    decoder: Decoder<BufReader<File>>,
    width: usize,
    height: usize,
    samples: usize,
    planar: bool,
    transform: GeoTransform,
}

impl std::fmt::Debug for GeoTiffDataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeoTiffDataset")
            .field("path", &self.path)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("samples", &self.samples)
            .field("planar", &self.planar)
            .field("transform", &self.transform)
            .finish()
    }
}

impl GeoTiffDataset {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| RasterError::from_io(path, e))?;
        let mut decoder = Decoder::new(BufReader::new(file))
            .map_err(|e| RasterError::open_failed(path, e.to_string()))?
            .with_limits(Limits::unlimited());

        let (width, height) = decoder.dimensions()?;
        let samples = match decoder.find_tag(Tag::SamplesPerPixel)? {
            Some(value) => value.into_u16()? as usize,
            None => 1,
        };
        let planar = match decoder.find_tag(Tag::PlanarConfiguration)? {
            Some(value) => value.into_u16()? == PLANAR_CONFIG_SEPARATE,
            None => false,
        };
        let transform = read_transform(&mut decoder)?
            .ok_or_else(|| RasterError::MissingGeoreference(path.to_path_buf()))?;

        debug!(
            path = %path.display(),
            width,
            height,
            samples,
            planar,
            "Opened GeoTIFF"
        );

        Ok(Self {
            path: path.to_path_buf(),
            decoder,
            width: width as usize,
            height: height as usize,
            samples,
            planar,
            transform,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RasterDataset for GeoTiffDataset {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn band_count(&self) -> usize {
        self.samples
    }

    fn transform(&self) -> GeoTransform {
        self.transform
    }

    fn read_window(&mut self, band: usize, window: &PixelWindow) -> Result<Vec<f64>> {
        self.check_band(band)?;
        let mut out = vec![f64::NAN; window.len()];
        if window.is_empty() {
            return Ok(out);
        }
        if window.col_off + window.width > self.width || window.row_off + window.height > self.height {
            return Err(RasterError::read_failed(format!(
                "window {:?} exceeds raster {}x{}",
                window, self.width, self.height
            )));
        }

        let (chunk_w, chunk_h) = self.decoder.chunk_dimensions();
        let (chunk_w, chunk_h) = (chunk_w as usize, chunk_h as usize);
        let chunks_across = self.width.div_ceil(chunk_w);
        let chunks_per_plane = chunks_across * self.height.div_ceil(chunk_h);

        // Chunky layouts interleave every band; separate planes hold one band each
        let (stride, offset, plane_base) = if self.planar {
            (1, 0, (band - 1) * chunks_per_plane)
        } else {
            (self.samples, band - 1, 0)
        };

        let first_chunk_row = window.row_off / chunk_h;
        let last_chunk_row = (window.row_off + window.height - 1) / chunk_h;
        let first_chunk_col = window.col_off / chunk_w;
        let last_chunk_col = (window.col_off + window.width - 1) / chunk_w;

        for chunk_row in first_chunk_row..=last_chunk_row {
            for chunk_col in first_chunk_col..=last_chunk_col {
                let index = plane_base + chunk_row * chunks_across + chunk_col;
                let values = decoding_result_to_f64(self.decoder.read_chunk(index as u32)?)?;

                let x0 = chunk_col * chunk_w;
                let y0 = chunk_row * chunk_h;
                let data_w = chunk_w.min(self.width - x0);
                let data_h = chunk_h.min(self.height - y0);

                // Edge tiles may come back padded to the full tile size
                let row_len = if values.len() >= chunk_w * chunk_h * stride {
                    chunk_w
                } else {
                    data_w
                };

                let rows = y0.max(window.row_off)..(y0 + data_h).min(window.row_off + window.height);
                let cols = x0.max(window.col_off)..(x0 + data_w).min(window.col_off + window.width);

                for row in rows {
                    for col in cols.clone() {
                        let src = ((row - y0) * row_len + (col - x0)) * stride + offset;
                        let dst = (row - window.row_off) * window.width + (col - window.col_off);
                        out[dst] = values.get(src).copied().unwrap_or(f64::NAN);
                    }
                }
            }
        }

        Ok(out)
    }
}

fn read_transform(decoder: &mut Decoder<BufReader<File>>) -> Result<Option<GeoTransform>> {
    if let Some(value) = decoder.find_tag(Tag::from_u16_exhaustive(GEOTIFF_MODELTRANSFORMATION))? {
        let m = value.into_f64_vec()?;
        if m.len() >= 8 {
            return Ok(Some(GeoTransform::new(m[0], m[1], m[3], m[4], m[5], m[7])));
        }
    }

    let scale = decoder.find_tag(Tag::from_u16_exhaustive(GEOTIFF_MODELPIXELSCALE))?;
    let tiepoint = decoder.find_tag(Tag::from_u16_exhaustive(GEOTIFF_MODELTIEPOINT))?;
    match (scale, tiepoint) {
        (Some(scale), Some(tiepoint)) => {
            let scale = scale.into_f64_vec()?;
            let tie = tiepoint.into_f64_vec()?;
            if scale.len() < 2 || tie.len() < 6 {
                return Ok(None);
            }
            // Tie raster point (i, j) to model point (x, y)
            let (sx, sy) = (scale[0], scale[1]);
            let (i, j, x, y) = (tie[0], tie[1], tie[3], tie[4]);
            Ok(Some(GeoTransform::new(sx, 0.0, x - i * sx, 0.0, -sy, y + j * sy)))
        }
        _ => Ok(None),
    }
}

fn decoding_result_to_f64(result: DecodingResult) -> Result<Vec<f64>> {
    let values = match result {
        DecodingResult::U8(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::U16(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::U32(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::U64(buf) => buf.into_iter().map(|v| v as f64).collect(),
        DecodingResult::I8(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::I16(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::I32(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::I64(buf) => buf.into_iter().map(|v| v as f64).collect(),
        DecodingResult::F32(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::F64(buf) => buf,
        #[allow(unreachable_patterns)]
        _ => {
            return Err(RasterError::UnsupportedSampleFormat(
                "unrecognised TIFF sample type".to_string(),
            ))
        }
    };
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_file_is_not_found() {
        let err = GeoTiffDataset::open(Path::new("/definitely/not/here.tif")).unwrap_err();
        assert!(matches!(err, RasterError::NotFound(_)));
    }

    #[test]
    fn test_decoding_result_conversion() {
        let values = decoding_result_to_f64(DecodingResult::I16(vec![-3, 0, 7])).unwrap();
        assert_eq!(values, vec![-3.0, 0.0, 7.0]);
    }
}
