//! Integration test: write GeoTIFF scenes and read windows back.
//!
//! Scenes use the ramp generator (value = col * 1000 + row) so every sample
//! identifies its own position.

use std::path::Path;
use std::sync::Arc;

use raster_io::{GeoTiffDataset, GeoTiffOpener, PixelWindow, RasterDataset, RasterError, WindowExtractor};
use test_utils::{constant_band, patch_band, ramp_band, write_geotiff, SceneSpec};
use zonal_common::BoundingBox;

const WIDTH: usize = 20;
const HEIGHT: usize = 16;

// 10 m pixels, upper-left at (500000, 200160)
fn scene() -> SceneSpec {
    SceneSpec::new(WIDTH, HEIGHT, 500_000.0, 200_160.0, 10.0).with_rows_per_strip(3)
}

fn write_scene(dir: &Path, bands: &[Vec<f32>]) -> std::path::PathBuf {
    let path = dir.join("S1A_20200105.tif");
    write_geotiff(&path, &scene(), bands).unwrap();
    path
}

// ============================================================================
// Dataset tests
// ============================================================================

#[test]
fn test_open_reads_georeference() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_scene(dir.path(), &[ramp_band(WIDTH, HEIGHT)]);

    let dataset = GeoTiffDataset::open(&path).unwrap();
    assert_eq!(dataset.width(), WIDTH);
    assert_eq!(dataset.height(), HEIGHT);
    assert_eq!(dataset.band_count(), 1);
    assert_eq!(dataset.transform(), scene().transform());
}

#[test]
fn test_read_window_across_strips() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_scene(dir.path(), &[ramp_band(WIDTH, HEIGHT)]);

    let mut dataset = GeoTiffDataset::open(&path).unwrap();
    // Rows 2..7 span three strips of three rows
    let values = dataset.read_window(1, &PixelWindow::new(4, 2, 3, 5)).unwrap();

    assert_eq!(values.len(), 15);
    for (i, value) in values.iter().enumerate() {
        let row = 2 + i / 3;
        let col = 4 + i % 3;
        assert_eq!(*value, (col * 1000 + row) as f64, "sample {}", i);
    }
}

#[test]
fn test_read_second_band_of_interleaved_scene() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_scene(
        dir.path(),
        &[constant_band(WIDTH, HEIGHT, 1.0), ramp_band(WIDTH, HEIGHT)],
    );

    let mut dataset = GeoTiffDataset::open(&path).unwrap();
    assert_eq!(dataset.band_count(), 3);
    let values = dataset.read_window(2, &PixelWindow::new(0, 15, 2, 1)).unwrap();
    assert_eq!(values, vec![15.0, 1015.0]);
}

#[test]
fn test_band_out_of_range() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_scene(dir.path(), &[ramp_band(WIDTH, HEIGHT)]);

    let mut dataset = GeoTiffDataset::open(&path).unwrap();
    let err = dataset.read_window(2, &PixelWindow::new(0, 0, 1, 1)).unwrap_err();
    assert!(matches!(err, RasterError::BandOutOfRange { band: 2, count: 1 }));
}

// ============================================================================
// Extractor tests
// ============================================================================

#[test]
fn test_extract_window_and_local_transform() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_scene(
        dir.path(),
        &[ramp_band(WIDTH, HEIGHT), constant_band(WIDTH, HEIGHT, 0.5)],
    );
    let extractor = WindowExtractor::new(Arc::new(GeoTiffOpener));

    // Columns 3..8, rows 4..10
    let bbox = BoundingBox::new(500_030.0, 200_060.0, 500_080.0, 200_120.0);
    let aoi = extractor.extract(&path, 1, &bbox).unwrap();

    assert_eq!(aoi.window, PixelWindow::new(3, 4, 5, 6));
    assert!(!aoi.all_nodata);
    assert_eq!(aoi.transform.c, 500_030.0);
    assert_eq!(aoi.transform.f, 200_120.0);
    assert_eq!(aoi.data.get(0, 0), Some(3004.0));
    assert_eq!(aoi.data.get(5, 4), Some(7009.0));

    let vh = extractor.extract(&path, 2, &bbox).unwrap();
    assert!(vh.data.values().iter().all(|v| *v == 0.5));
}

#[test]
fn test_extract_outside_scene() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_scene(dir.path(), &[ramp_band(WIDTH, HEIGHT)]);
    let extractor = WindowExtractor::new(Arc::new(GeoTiffOpener));

    let bbox = BoundingBox::new(400_000.0, 100_000.0, 400_500.0, 100_500.0);
    let aoi = extractor.extract(&path, 1, &bbox).unwrap();
    assert!(aoi.data.is_empty());
    assert!(aoi.all_nodata);
}

#[test]
fn test_extract_zero_scene_is_nodata() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_scene(dir.path(), &[constant_band(WIDTH, HEIGHT, 0.0)]);
    let extractor = WindowExtractor::new(Arc::new(GeoTiffOpener));

    let bbox = BoundingBox::new(500_000.0, 200_000.0, 500_200.0, 200_160.0);
    assert!(extractor.extract(&path, 1, &bbox).unwrap().all_nodata);
}

#[test]
fn test_extract_swath_edge_is_usable() {
    let dir = tempfile::tempdir().unwrap();
    // A single non-zero pixel at column 10, row 8
    let band = patch_band(WIDTH, HEIGHT, (10, 8, 11, 9), 0.031);
    let path = write_scene(dir.path(), &[band]);
    let extractor = WindowExtractor::new(Arc::new(GeoTiffOpener));

    let bbox = BoundingBox::new(500_000.0, 200_000.0, 500_200.0, 200_160.0);
    assert!(!extractor.extract(&path, 1, &bbox).unwrap().all_nodata);
}

#[test]
fn test_extract_missing_file() {
    let extractor = WindowExtractor::new(Arc::new(GeoTiffOpener));
    let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
    let err = extractor
        .extract(Path::new("/no/such/scene.tif"), 1, &bbox)
        .unwrap_err();
    assert!(matches!(err, RasterError::NotFound(_)));
}
