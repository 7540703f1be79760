//! Example: Crop square aerial images around each building footprint.
//!
//! Usage: cargo run --example crop_images -- <footprints.geojson> <catalog.csv> <cache_dir> <base_url> [output_dir]

use std::env;
use std::time::Instant;

use solpot_extract::{
    run_batch, write_overview_csv, FootprintSource, GeoJsonFootprints, ImageCropper,
};
use solpot_geom::CrsTransformer;
use solpot_tiles::{DatasetKind, StoreConfig, TileCatalog, TileStore};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 5 {
        eprintln!(
            "Usage: {} <footprints.geojson> <catalog.csv> <cache_dir> <base_url> [output_dir]",
            args[0]
        );
        std::process::exit(1);
    }

    let footprints_path = &args[1];
    let catalog_path = &args[2];
    let cache_dir = &args[3];
    let base_url = &args[4];
    let output_dir = args.get(5).map(|s| s.as_str()).unwrap_or("crops");

    let transformer = CrsTransformer::utm32n().expect("Failed to build CRS transformer");

    let catalog = TileCatalog::from_explicit_csv(catalog_path).expect("Failed to parse catalog");
    let store = TileStore::new(
        catalog.into_index(),
        StoreConfig {
            kind: DatasetKind::AerialImage,
            cache_dir: cache_dir.into(),
            base_url: base_url.clone(),
        },
    )
    .expect("Failed to create tile store");
    println!("Indexed {} image tiles", store.index().len());

    let footprints = GeoJsonFootprints::new(footprints_path)
        .load(&transformer)
        .expect("Failed to load footprints");
    println!("Loaded {} buildings", footprints.len());

    let cropper =
        ImageCropper::new(&store, &transformer, output_dir).expect("Failed to create cropper");

    let start = Instant::now();
    let outcome = run_batch(&footprints, |building| cropper.crop_building(building))
        .expect("Batch aborted");
    println!(
        "Cropped {} buildings ({} failed) in {:.2}s",
        outcome.records.len(),
        outcome.failures.len(),
        start.elapsed().as_secs_f64()
    );

    let overview_csv = format!("{output_dir}/overview.csv");
    write_overview_csv(&outcome.records, &overview_csv).expect("Failed to write overview CSV");
    println!("Wrote {overview_csv}");
}
