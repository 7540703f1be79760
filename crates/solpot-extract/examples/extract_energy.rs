//! Example: Extract per-building solar-energy yield for a footprint file.
//!
//! Usage: cargo run --example extract_energy -- <footprints.geojson> <catalog.csv> <cache_dir> <base_url> [output_dir]

use std::env;
use std::time::Instant;

use solpot_extract::{
    combine, run_batch, write_combined_csv, write_energy_csv, EnergyExtractor, FootprintSource,
    GeoJsonFootprints,
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
        eprintln!(
            "Example: {} buildings.geojson Strahlungsenergie-0.5.csv ./energy_tiles https://example.org/energy out",
            args[0]
        );
        std::process::exit(1);
    }

    let footprints_path = &args[1];
    let catalog_path = &args[2];
    let cache_dir = &args[3];
    let base_url = &args[4];
    let output_dir = args.get(5).map(|s| s.as_str()).unwrap_or(".");

    let transformer = CrsTransformer::utm32n().expect("Failed to build CRS transformer");

    println!("Indexing energy tiles from {}...", catalog_path);
    let start = Instant::now();
    let catalog = TileCatalog::from_explicit_csv(catalog_path).expect("Failed to parse catalog");
    let store = TileStore::new(
        catalog.into_index(),
        StoreConfig {
            kind: DatasetKind::EnergyYield50Cm,
            cache_dir: cache_dir.into(),
            base_url: base_url.clone(),
        },
    )
    .expect("Failed to create tile store");
    println!(
        "Indexed {} tiles in {:.3}s",
        store.index().len(),
        start.elapsed().as_secs_f64()
    );

    println!("Loading footprints from {}...", footprints_path);
    let footprints = GeoJsonFootprints::new(footprints_path)
        .load(&transformer)
        .expect("Failed to load footprints");
    println!("Loaded {} buildings", footprints.len());

    let extractor = EnergyExtractor::new(&store, &transformer);
    let start = Instant::now();
    let outcome = run_batch(&footprints, |building| {
        extractor.extract_building(building).map(Some)
    })
    .expect("Batch aborted");
    println!(
        "Extracted {} buildings ({} skipped) in {:.2}s",
        outcome.records.len(),
        outcome.failures.len(),
        start.elapsed().as_secs_f64()
    );

    let stats = store.download_stats();
    println!(
        "Downloaded {} tiles ({} bytes)",
        stats.tiles_downloaded, stats.bytes_downloaded
    );

    std::fs::create_dir_all(output_dir).expect("Failed to create output dir");
    let energy_csv = format!("{output_dir}/energy_yield.csv");
    write_energy_csv(&outcome.records, &energy_csv).expect("Failed to write energy CSV");
    println!("Wrote {energy_csv}");

    let combined_csv = format!("{output_dir}/buildings_combined.csv");
    let combined = combine(&footprints, &outcome.records);
    write_combined_csv(&combined, &combined_csv).expect("Failed to write combined CSV");
    println!("Wrote {combined_csv}");
}
