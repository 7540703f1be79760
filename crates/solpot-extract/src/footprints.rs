//! Building footprints and the external vector source seam.

use std::fs;
use std::path::{Path, PathBuf};

use geo::{Area, BoundingRect, Geometry, Polygon, Rect};
use solpot_geom::CrsTransformer;
use solpot_tiles::bounds_from_tile_name;

use crate::{ExtractError, Result};

/// One building outline as consumed by the pipelines.
///
/// Geometry stays in geographic coordinates (the source's frame); the
/// pipelines project it on demand. `area_sqm` is the projected area, so it
/// is meters-correct.
#[derive(Debug, Clone)]
pub struct BuildingFootprint {
    /// Unique building identifier.
    pub id: String,
    /// Outline polygon, geographic coordinates (lon/lat degrees).
    pub geometry: Polygon<f64>,
    /// Footprint area in m², measured in the projected system.
    pub area_sqm: f64,
}

/// Where building footprints come from. The feature-querying service
/// behind it (OSM or otherwise) is someone else's problem; the pipelines
/// only need polygons keyed by id.
pub trait FootprintSource {
    /// Load all footprints, deriving projected areas with `transformer`.
    fn load(&self, transformer: &CrsTransformer) -> Result<Vec<BuildingFootprint>>;
}

/// Footprints from a GeoJSON FeatureCollection with a `building_id`
/// property per feature.
#[derive(Debug, Clone)]
pub struct GeoJsonFootprints {
    path: PathBuf,
}

impl GeoJsonFootprints {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl FootprintSource for GeoJsonFootprints {
    fn load(&self, transformer: &CrsTransformer) -> Result<Vec<BuildingFootprint>> {
        let text = fs::read_to_string(&self.path)?;
        parse_geojson_footprints(&text, transformer).map_err(|e| match e {
            ExtractError::Footprints { reason, .. } => ExtractError::Footprints {
                path: self.path.display().to_string(),
                reason,
            },
            other => other,
        })
    }
}

/// Parse a GeoJSON FeatureCollection into footprints.
///
/// Each feature needs a `building_id` property (string or number) and a
/// Polygon or MultiPolygon geometry; for a MultiPolygon the largest part
/// is kept.
pub fn parse_geojson_footprints(
    text: &str,
    transformer: &CrsTransformer,
) -> Result<Vec<BuildingFootprint>> {
    let geojson: geojson::GeoJson = text.parse().map_err(|e: geojson::Error| footprints_err(e))?;
    let collection =
        geojson::FeatureCollection::try_from(geojson).map_err(|e| footprints_err(e))?;

    let mut out = Vec::with_capacity(collection.features.len());
    for (i, feature) in collection.features.into_iter().enumerate() {
        let id = feature
            .properties
            .as_ref()
            .and_then(|props| props.get("building_id"))
            .and_then(property_as_id)
            .ok_or_else(|| {
                footprints_err(format!("feature {i} is missing a `building_id` property"))
            })?;

        let geometry = feature.geometry.ok_or_else(|| {
            footprints_err(format!("building `{id}` has no geometry"))
        })?;
        let geometry: Geometry<f64> = geometry
            .try_into()
            .map_err(|e: geojson::Error| footprints_err(format!("building `{id}`: {e}")))?;
        let polygon = largest_polygon(geometry)
            .ok_or_else(|| footprints_err(format!("building `{id}` is not a polygon")))?;

        let projected = transformer.polygon_to_projected(&polygon)?;
        let area_sqm = projected.unsigned_area();

        out.push(BuildingFootprint {
            id,
            geometry: polygon,
            area_sqm,
        });
    }
    Ok(out)
}

fn footprints_err(reason: impl ToString) -> ExtractError {
    ExtractError::Footprints {
        path: String::new(),
        reason: reason.to_string(),
    }
}

fn property_as_id(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn largest_polygon(geometry: Geometry<f64>) -> Option<Polygon<f64>> {
    match geometry {
        Geometry::Polygon(p) => Some(p),
        Geometry::MultiPolygon(mp) => mp
            .into_iter()
            .max_by(|a, b| a.unsigned_area().total_cmp(&b.unsigned_area())),
        _ => None,
    }
}

/// Geographic bounding box of a named tile, for handing to a footprint
/// query service. The tile footprint is derived from the name alone, so
/// this works without a catalog row.
pub fn tile_bbox_wgs84(tile_name: &str, transformer: &CrsTransformer) -> Result<Rect<f64>> {
    let footprint = bounds_from_tile_name(tile_name)?;
    let outline = footprint.to_rect().to_polygon();
    let geographic = transformer.polygon_to_geographic(&outline)?;
    geographic
        .bounding_rect()
        .ok_or_else(|| ExtractError::EmptyGeometry(tile_name.to_string()))
}
