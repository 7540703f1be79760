//! # solpot-geom
//!
//! Coordinate transforms and geometry helpers shared by the solar potential
//! extraction pipelines.
//!
//! The vector footprint source delivers building outlines in geographic
//! coordinates (WGS84, EPSG:4326) while all raster datasets live in a
//! projected, meter-based system (ETRS89 / UTM zone 32N, EPSG:25832).
//! [`CrsTransformer`] converts arbitrary geometries between the two,
//! vertex-wise and topology-preserving.
//!
//! Constructing the projection objects is not free, so a transformer is
//! built once per job and passed by reference; it is `Send + Sync` and can
//! be shared across worker threads.
//!
//! ```no_run
//! use geo::{polygon, Geometry};
//! use solpot_geom::CrsTransformer;
//!
//! let transformer = CrsTransformer::utm32n()?;
//! let footprint: Geometry<f64> = polygon![
//!     (x: 7.1, y: 51.2),
//!     (x: 7.1005, y: 51.2),
//!     (x: 7.1005, y: 51.2004),
//!     (x: 7.1, y: 51.2004),
//! ].into();
//! let projected = transformer.to_projected(&footprint)?;
//! # Ok::<(), solpot_geom::GeomError>(())
//! ```

mod crop;
mod error;
mod transform;

pub use crop::squared_box_around;
pub use error::GeomError;
pub use transform::{CrsTransformer, GEOGRAPHIC_EPSG, PROJECTED_EPSG};

/// Result type for geometry operations.
pub type Result<T> = std::result::Result<T, GeomError>;
