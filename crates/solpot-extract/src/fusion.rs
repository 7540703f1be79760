//! Join per-building outputs into one combined table.

use std::collections::HashMap;
use std::path::Path;

use serde::Serialize;

use crate::{BuildingFootprint, EnergyRecord, Result};

/// A footprint joined with its energy yield, if one was extracted.
///
/// Left join: buildings without an energy row keep `None` fields rather
/// than being dropped, so coverage gaps stay visible downstream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombinedRecord {
    pub building_id: String,
    /// Footprint area in m².
    pub area_sqm: f64,
    pub annual_energy_yield_kwh: Option<f64>,
    pub pixels_covered: Option<usize>,
}

/// Join energy records onto footprints by building id.
pub fn combine(
    footprints: &[BuildingFootprint],
    energy: &[EnergyRecord],
) -> Vec<CombinedRecord> {
    let by_id: HashMap<&str, &EnergyRecord> = energy
        .iter()
        .map(|record| (record.building_id.as_str(), record))
        .collect();

    footprints
        .iter()
        .map(|building| {
            let energy = by_id.get(building.id.as_str());
            CombinedRecord {
                building_id: building.id.clone(),
                area_sqm: building.area_sqm,
                annual_energy_yield_kwh: energy.map(|r| r.annual_energy_yield_kwh),
                pixels_covered: energy.map(|r| r.pixels_covered),
            }
        })
        .collect()
}

/// Write combined records as CSV; missing yields serialize as empty cells.
pub fn write_combined_csv<P: AsRef<Path>>(records: &[CombinedRecord], path: P) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}
