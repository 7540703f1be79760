//! # solpot-extract
//!
//! Per-building extraction pipelines on top of the tile and raster layers:
//!
//! - [`ImageCropper`]: squared RGB crops around each building, plus an
//!   `overview.csv` of crop georeferencing.
//! - [`EnergyExtractor`]: annual solar-energy yield per building from
//!   irradiance tiles, written to `energy_yield.csv`.
//! - [`combine`]: left join of footprints and energy records.
//! - [`run_batch`]: the rayon batch driver with per-building failure
//!   capture.
//!
//! Footprints come in through the [`FootprintSource`] seam; the pipelines
//! never talk to the vector-feature service directly.

mod batch;
mod cropper;
mod energy;
mod error;
mod footprints;
mod fusion;

pub use batch::{run_batch, BatchOutcome, BuildingFailure};
pub use cropper::{
    read_overview_csv, write_overview_csv, ImageCropper, OverviewRecord, CROP_MARGIN_M,
};
pub use energy::{read_energy_csv, write_energy_csv, EnergyExtractor, EnergyRecord};
pub use error::ExtractError;
pub use footprints::{
    parse_geojson_footprints, tile_bbox_wgs84, BuildingFootprint, FootprintSource,
    GeoJsonFootprints,
};
pub use fusion::{combine, write_combined_csv, CombinedRecord};

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractError>;
