//! Per-building solar-energy yield from irradiance tiles.

use std::path::Path;

use geo::{BoundingRect, Centroid, Polygon};
use serde::{Deserialize, Serialize};
use solpot_geom::CrsTransformer;
use solpot_raster::{masked_sum, rasterize, RasterTile};
use solpot_tiles::TileStore;

use crate::{BuildingFootprint, ExtractError, Result};

/// One row of `energy_yield.csv`.
///
/// `pixels_covered` distinguishes a true zero-yield roof from a building
/// whose footprint fell outside the available raster (both sum to 0 kWh).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyRecord {
    pub building_id: String,
    /// Annual yield in kWh, summed over the footprint.
    pub annual_energy_yield_kwh: f64,
    /// Number of raster pixels the footprint touched.
    pub pixels_covered: usize,
}

/// Sums irradiance pixels under each building footprint.
///
/// The store is expected to serve an energy-yield dataset; its per-pixel
/// ground area converts the kWh/m² pixel values into kWh.
pub struct EnergyExtractor<'a> {
    store: &'a TileStore,
    transformer: &'a CrsTransformer,
}

impl<'a> EnergyExtractor<'a> {
    pub fn new(store: &'a TileStore, transformer: &'a CrsTransformer) -> Self {
        Self { store, transformer }
    }

    /// Extract the yield for one building.
    pub fn extract_building(&self, building: &BuildingFootprint) -> Result<EnergyRecord> {
        let projected = self.transformer.polygon_to_projected(&building.geometry)?;
        self.extract_projected(&building.id, &projected)
    }

    /// Extract the yield for an already-projected footprint polygon.
    ///
    /// The tile is located by the footprint centroid, fetched if absent,
    /// and only the pixel window under the footprint's bounding box is
    /// read. The footprint is rasterized all-touched against that window's
    /// own grid, no-data pixels count as zero, and the masked sum is
    /// scaled by the dataset's pixel area.
    pub fn extract_projected(
        &self,
        building_id: &str,
        footprint: &Polygon<f64>,
    ) -> Result<EnergyRecord> {
        let centroid = footprint
            .centroid()
            .ok_or_else(|| ExtractError::EmptyGeometry(building_id.to_string()))?;

        let tile_name = self
            .store
            .index()
            .locate_by_point(centroid.x(), centroid.y())
            .map_err(ExtractError::Tile)?
            .to_string();
        let tile_path = self.store.ensure_available(&tile_name, false)?;

        let bounds = footprint
            .bounding_rect()
            .ok_or_else(|| ExtractError::EmptyGeometry(building_id.to_string()))?;

        let mut tile = RasterTile::open(&tile_path)?;
        let window = tile.read_window_f32(&bounds)?;

        let mask = rasterize(footprint, window.width, window.height, &window.transform);
        let aggregate = masked_sum(&window, &mask)?;

        if aggregate.pixels_covered == 0 {
            tracing::warn!(
                building = building_id,
                tile = %tile_name,
                "footprint covers no pixels of its tile"
            );
        }

        Ok(EnergyRecord {
            building_id: building_id.to_string(),
            annual_energy_yield_kwh: aggregate.sum * self.store.kind().pixel_area_sqm(),
            pixels_covered: aggregate.pixels_covered,
        })
    }
}

/// Write energy records as `energy_yield.csv`.
pub fn write_energy_csv<P: AsRef<Path>>(records: &[EnergyRecord], path: P) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read back an `energy_yield.csv`.
pub fn read_energy_csv<P: AsRef<Path>>(path: P) -> Result<Vec<EnergyRecord>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut records = Vec::new();
    for record in reader.deserialize() {
        records.push(record?);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn energy_csv_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("energy_yield.csv");

        let records = vec![
            EnergyRecord {
                building_id: "way-101".to_string(),
                annual_energy_yield_kwh: 1234.5,
                pixels_covered: 96,
            },
            EnergyRecord {
                building_id: "way-102".to_string(),
                annual_energy_yield_kwh: 0.0,
                pixels_covered: 0,
            },
        ];

        write_energy_csv(&records, &path).unwrap();
        assert_eq!(read_energy_csv(&path).unwrap(), records);
    }
}
