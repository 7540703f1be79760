//! Bidirectional reprojection between the projected raster CRS and WGS84.

use geo::{Coord, Geometry, MapCoords, Point, Polygon};
use proj4rs::proj::Proj;
use proj4rs::transform::transform;

use crate::{GeomError, Result};

/// Projected CRS used by all raster datasets: ETRS89 / UTM zone 32N, meters.
pub const PROJECTED_EPSG: u16 = 25832;

/// Geographic CRS used by the footprint source: WGS84, degrees.
pub const GEOGRAPHIC_EPSG: u16 = 4326;

/// Construct-once transformer between a projected CRS and WGS84.
///
/// Holds the parsed projection definitions for both systems. Building these
/// is comparatively expensive, so create one transformer per job and share
/// it by reference across workers.
pub struct CrsTransformer {
    projected: Proj,
    geographic: Proj,
    projected_epsg: u16,
}

impl std::fmt::Debug for CrsTransformer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrsTransformer")
            .field("projected_epsg", &self.projected_epsg)
            .field("geographic_epsg", &GEOGRAPHIC_EPSG)
            .finish()
    }
}

fn proj_for_epsg(epsg: u16) -> Result<Proj> {
    let def = crs_definitions::from_code(epsg).ok_or(GeomError::UnknownCrs(epsg))?;
    Proj::from_proj_string(def.proj4).map_err(|e| GeomError::InvalidProjection {
        epsg,
        reason: format!("{e:?}"),
    })
}

impl CrsTransformer {
    /// Create a transformer between the given projected CRS and WGS84.
    pub fn new(projected_epsg: u16) -> Result<Self> {
        Ok(Self {
            projected: proj_for_epsg(projected_epsg)?,
            geographic: proj_for_epsg(GEOGRAPHIC_EPSG)?,
            projected_epsg,
        })
    }

    /// Transformer for the standard dataset pairing, UTM 32N ↔ WGS84.
    pub fn utm32n() -> Result<Self> {
        Self::new(PROJECTED_EPSG)
    }

    /// EPSG code of the projected system.
    pub fn projected_epsg(&self) -> u16 {
        self.projected_epsg
    }

    /// Transform a geometry from WGS84 degrees into projected meters.
    ///
    /// Applied vertex-wise; ring ordering and hole structure are preserved.
    pub fn to_projected(&self, geom: &Geometry<f64>) -> Result<Geometry<f64>> {
        geom.try_map_coords(|c| self.project_coord(c, Direction::ToProjected))
    }

    /// Transform a geometry from projected meters into WGS84 degrees.
    pub fn to_geographic(&self, geom: &Geometry<f64>) -> Result<Geometry<f64>> {
        geom.try_map_coords(|c| self.project_coord(c, Direction::ToGeographic))
    }

    /// Point convenience wrapper around [`Self::to_projected`].
    pub fn point_to_projected(&self, point: Point<f64>) -> Result<Point<f64>> {
        let c = self.project_coord(point.0, Direction::ToProjected)?;
        Ok(Point::from(c))
    }

    /// Point convenience wrapper around [`Self::to_geographic`].
    pub fn point_to_geographic(&self, point: Point<f64>) -> Result<Point<f64>> {
        let c = self.project_coord(point.0, Direction::ToGeographic)?;
        Ok(Point::from(c))
    }

    /// Polygon convenience wrapper around [`Self::to_projected`].
    pub fn polygon_to_projected(&self, polygon: &Polygon<f64>) -> Result<Polygon<f64>> {
        polygon.try_map_coords(|c| self.project_coord(c, Direction::ToProjected))
    }

    /// Polygon convenience wrapper around [`Self::to_geographic`].
    pub fn polygon_to_geographic(&self, polygon: &Polygon<f64>) -> Result<Polygon<f64>> {
        polygon.try_map_coords(|c| self.project_coord(c, Direction::ToGeographic))
    }

    fn project_coord(&self, c: Coord<f64>, direction: Direction) -> Result<Coord<f64>> {
        if !c.x.is_finite() || !c.y.is_finite() {
            return Err(GeomError::NonFiniteCoordinate { x: c.x, y: c.y });
        }

        // proj4rs expects and produces radians for geographic CRSs.
        let mut point = match direction {
            Direction::ToProjected => (c.x.to_radians(), c.y.to_radians(), 0.0),
            Direction::ToGeographic => (c.x, c.y, 0.0),
        };

        let (src, dst) = match direction {
            Direction::ToProjected => (&self.geographic, &self.projected),
            Direction::ToGeographic => (&self.projected, &self.geographic),
        };
        transform(src, dst, &mut point).map_err(|e| GeomError::Transform(format!("{e:?}")))?;

        let out = match direction {
            Direction::ToProjected => Coord {
                x: point.0,
                y: point.1,
            },
            Direction::ToGeographic => Coord {
                x: point.0.to_degrees(),
                y: point.1.to_degrees(),
            },
        };

        if !out.x.is_finite() || !out.y.is_finite() {
            return Err(GeomError::NonFiniteCoordinate { x: out.x, y: out.y });
        }
        Ok(out)
    }
}

#[derive(Clone, Copy)]
enum Direction {
    ToProjected,
    ToGeographic,
}
