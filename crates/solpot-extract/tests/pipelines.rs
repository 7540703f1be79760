//! End-to-end pipeline tests against synthetic tiles in a local cache.

use std::fs;
use std::path::Path;

use approx::assert_relative_eq;
use geo::{Coord, Rect};
use solpot_extract::{
    run_batch, BuildingFootprint, EnergyExtractor, ExtractError, ImageCropper,
};
use solpot_geom::CrsTransformer;
use solpot_tiles::{DatasetKind, StoreConfig, TileCatalog, TileStore};
use tiff::encoder::{colortype, TiffEncoder};
use tiff::tags::Tag;

const MODEL_PIXEL_SCALE: Tag = Tag::Unknown(33550);
const MODEL_TIEPOINT: Tag = Tag::Unknown(33922);

/// Write a square single-band f32 GeoTIFF of all-ones pixels.
fn write_gray_tile(path: &Path, size: u32, origin_x: f64, origin_y: f64, pixel: f64) {
    let mut file = fs::File::create(path).unwrap();
    let mut encoder = TiffEncoder::new(&mut file).unwrap();
    let mut image = encoder
        .new_image::<colortype::Gray32Float>(size, size)
        .unwrap();
    image
        .encoder()
        .write_tag(MODEL_PIXEL_SCALE, &[pixel, pixel, 0.0][..])
        .unwrap();
    image
        .encoder()
        .write_tag(MODEL_TIEPOINT, &[0.0, 0.0, 0.0, origin_x, origin_y, 0.0][..])
        .unwrap();
    let data = vec![1.0f32; (size * size) as usize];
    image.write_data(&data).unwrap();
}

/// Write a square RGB GeoTIFF with a constant color.
fn write_rgb_tile(path: &Path, size: u32, origin_x: f64, origin_y: f64, pixel: f64) {
    let mut file = fs::File::create(path).unwrap();
    let mut encoder = TiffEncoder::new(&mut file).unwrap();
    let mut image = encoder.new_image::<colortype::RGB8>(size, size).unwrap();
    image
        .encoder()
        .write_tag(MODEL_PIXEL_SCALE, &[pixel, pixel, 0.0][..])
        .unwrap();
    image
        .encoder()
        .write_tag(MODEL_TIEPOINT, &[0.0, 0.0, 0.0, origin_x, origin_y, 0.0][..])
        .unwrap();
    let data = vec![80u8; (size * size * 3) as usize];
    image.write_data(&data).unwrap();
}

fn catalog_csv(dir: &Path, rows: &str) -> std::path::PathBuf {
    let path = dir.join("catalog.csv");
    fs::write(&path, format!("tile_name,min_x,min_y,extent\n{rows}")).unwrap();
    path
}

/// A footprint whose projected shape is the given UTM rect, id included.
fn footprint_from_utm(
    id: &str,
    transformer: &CrsTransformer,
    rect: Rect<f64>,
) -> BuildingFootprint {
    let geometry = transformer
        .polygon_to_geographic(&rect.to_polygon())
        .unwrap();
    BuildingFootprint {
        id: id.to_string(),
        geometry,
        area_sqm: rect.width() * rect.height(),
    }
}

#[test]
fn energy_extraction_sums_footprint_pixels() {
    let dir = tempfile::tempdir().unwrap();
    let transformer = CrsTransformer::utm32n().unwrap();

    // One 4 m energy tile of all-ones kWh/m² pixels at 0.5 m resolution.
    let cache = dir.path().join("energy");
    fs::create_dir_all(&cache).unwrap();
    write_gray_tile(&cache.join("t1.tif"), 8, 355_000.0, 5_645_004.0, 0.5);

    let catalog = catalog_csv(dir.path(), "t1,355000,5645000,4\n");
    let store = TileStore::new(
        TileCatalog::from_explicit_csv(&catalog).unwrap().into_index(),
        StoreConfig {
            kind: DatasetKind::EnergyYield50Cm,
            cache_dir: cache,
            base_url: "http://example.invalid/energy".to_string(),
        },
    )
    .unwrap();

    // A 1.5 m square whose corners sit strictly inside pixels 2 and 5 of
    // each axis: all-touched coverage is exactly 4x4 pixels.
    let building = footprint_from_utm(
        "way-1",
        &transformer,
        Rect::new(
            Coord {
                x: 355_001.25,
                y: 5_645_001.25,
            },
            Coord {
                x: 355_002.75,
                y: 5_645_002.75,
            },
        ),
    );

    let extractor = EnergyExtractor::new(&store, &transformer);
    let record = extractor.extract_building(&building).unwrap();

    assert_eq!(record.building_id, "way-1");
    assert_eq!(record.pixels_covered, 16);
    // 16 pixels x 1 kWh/m² x 0.25 m².
    assert_relative_eq!(record.annual_energy_yield_kwh, 4.0, epsilon = 1e-9);
}

#[test]
fn batch_skips_buildings_outside_coverage() {
    let dir = tempfile::tempdir().unwrap();
    let transformer = CrsTransformer::utm32n().unwrap();

    let cache = dir.path().join("energy");
    fs::create_dir_all(&cache).unwrap();
    write_gray_tile(&cache.join("t1.tif"), 8, 355_000.0, 5_645_004.0, 0.5);

    let catalog = catalog_csv(dir.path(), "t1,355000,5645000,4\n");
    let store = TileStore::new(
        TileCatalog::from_explicit_csv(&catalog).unwrap().into_index(),
        StoreConfig {
            kind: DatasetKind::EnergyYield50Cm,
            cache_dir: cache,
            base_url: "http://example.invalid/energy".to_string(),
        },
    )
    .unwrap();

    let inside = footprint_from_utm(
        "inside",
        &transformer,
        Rect::new(
            Coord {
                x: 355_001.0,
                y: 5_645_001.0,
            },
            Coord {
                x: 355_003.0,
                y: 5_645_003.0,
            },
        ),
    );
    // 100 m east of the only cataloged tile.
    let outside = footprint_from_utm(
        "outside",
        &transformer,
        Rect::new(
            Coord {
                x: 355_101.0,
                y: 5_645_001.0,
            },
            Coord {
                x: 355_103.0,
                y: 5_645_003.0,
            },
        ),
    );

    let extractor = EnergyExtractor::new(&store, &transformer);
    let outcome = run_batch(&[inside, outside], |b| {
        extractor.extract_building(b).map(Some)
    })
    .unwrap();

    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.records[0].building_id, "inside");
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].building_id, "outside");
    assert!(matches!(
        outcome.failures[0].error,
        ExtractError::Tile(solpot_tiles::TileError::NoTileFound { .. })
    ));
}

#[test]
fn cropper_writes_square_pngs_with_georeferencing() {
    let dir = tempfile::tempdir().unwrap();
    let transformer = CrsTransformer::utm32n().unwrap();

    // One 32 m aerial tile at 0.5 m resolution.
    let cache = dir.path().join("images");
    fs::create_dir_all(&cache).unwrap();
    write_rgb_tile(&cache.join("img.tif"), 64, 355_000.0, 5_645_032.0, 0.5);

    let catalog = catalog_csv(dir.path(), "img,355000,5645000,32\n");
    let store = TileStore::new(
        TileCatalog::from_explicit_csv(&catalog).unwrap().into_index(),
        StoreConfig {
            kind: DatasetKind::AerialImage,
            cache_dir: cache,
            base_url: "http://example.invalid/images".to_string(),
        },
    )
    .unwrap();

    let output = dir.path().join("crops");
    let cropper = ImageCropper::new(&store, &transformer, &output).unwrap();

    // A 2 m building in the middle of the tile; with the 5 m margin the
    // squared crop box is 12 m. The box edges fall mid-pixel, so outward
    // rounding grows it to 25x25 pixels.
    let building = footprint_from_utm(
        "way-7",
        &transformer,
        Rect::new(
            Coord {
                x: 355_014.2,
                y: 5_645_014.2,
            },
            Coord {
                x: 355_016.2,
                y: 5_645_016.2,
            },
        ),
    );

    let record = cropper.crop_building(&building).unwrap().unwrap();
    assert_eq!(record.image_filename, "way-7.png");
    assert_eq!(record.image_shape_width, 25);
    assert_eq!(record.image_shape_height, 25);

    let (png_w, png_h) = image::image_dimensions(output.join("way-7.png")).unwrap();
    assert_eq!(png_w, 25);
    assert_eq!(png_h, 25);

    // The stored transform reopens the crop in projected space. The crop
    // box spans x 355009.2.., which snaps out to pixel column 18.
    let t = record.transform();
    assert_relative_eq!(t.pixel_area(), 0.25);
    let (x, y) = t.px_to_geo(0.0, 0.0);
    assert_relative_eq!(x, 355_009.0, epsilon = 1e-6);
    assert_relative_eq!(y, 5_645_021.5, epsilon = 1e-6);
}

#[test]
fn cropper_skips_crops_truncated_by_tile_edge() {
    let dir = tempfile::tempdir().unwrap();
    let transformer = CrsTransformer::utm32n().unwrap();

    let cache = dir.path().join("images");
    fs::create_dir_all(&cache).unwrap();
    write_rgb_tile(&cache.join("img.tif"), 64, 355_000.0, 5_645_032.0, 0.5);

    let catalog = catalog_csv(dir.path(), "img,355000,5645000,32\n");
    let store = TileStore::new(
        TileCatalog::from_explicit_csv(&catalog).unwrap().into_index(),
        StoreConfig {
            kind: DatasetKind::AerialImage,
            cache_dir: cache,
            base_url: "http://example.invalid/images".to_string(),
        },
    )
    .unwrap();

    let output = dir.path().join("crops");
    let cropper = ImageCropper::new(&store, &transformer, &output).unwrap();

    // Centroid inside the tile, but the 5 m margin pushes the crop box
    // past the western edge; the clamped window is no longer square.
    let building = footprint_from_utm(
        "edge-1",
        &transformer,
        Rect::new(
            Coord {
                x: 355_001.0,
                y: 5_645_014.0,
            },
            Coord {
                x: 355_003.0,
                y: 5_645_016.0,
            },
        ),
    );

    assert!(cropper.crop_building(&building).unwrap().is_none());
    assert!(!output.join("edge-1.png").exists());
}
