//! Parallel per-building batch driver.

use rayon::prelude::*;

use crate::{BuildingFootprint, ExtractError, Result};

/// One building that failed and was skipped.
#[derive(Debug)]
pub struct BuildingFailure {
    pub building_id: String,
    pub error: ExtractError,
}

/// Records produced by a batch, plus the buildings that were skipped.
#[derive(Debug)]
pub struct BatchOutcome<T> {
    pub records: Vec<T>,
    pub failures: Vec<BuildingFailure>,
}

/// Run `op` over all buildings in parallel.
///
/// Each building is independent; tile downloads are already single-flight
/// inside the store, so workers hitting the same uncached tile share one
/// fetch. Per-building failures are logged with the building id, collected
/// and skipped. Fatal errors (see [`ExtractError::is_fatal`]) abort the
/// whole batch instead: they mean the shared catalog or tile grid is
/// corrupt and every remaining result would be suspect. `op` returning
/// `Ok(None)` drops the building silently (the op logged its own reason).
pub fn run_batch<T, F>(buildings: &[BuildingFootprint], op: F) -> Result<BatchOutcome<T>>
where
    T: Send,
    F: Fn(&BuildingFootprint) -> Result<Option<T>> + Sync,
{
    let results: Vec<(String, Result<Option<T>>)> = buildings
        .par_iter()
        .map(|building| (building.id.clone(), op(building)))
        .collect();

    let mut records = Vec::with_capacity(results.len());
    let mut failures = Vec::new();
    for (building_id, result) in results {
        match result {
            Ok(Some(record)) => records.push(record),
            Ok(None) => {}
            Err(error) if error.is_fatal() => return Err(error),
            Err(error) => {
                tracing::warn!(building = %building_id, %error, "skipping building");
                failures.push(BuildingFailure { building_id, error });
            }
        }
    }

    Ok(BatchOutcome { records, failures })
}
