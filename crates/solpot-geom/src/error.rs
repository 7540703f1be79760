//! Error types for coordinate transforms.

use thiserror::Error;

/// Errors that can occur when transforming geometries between reference
/// systems.
#[derive(Debug, Error)]
pub enum GeomError {
    /// The EPSG code is not in the crs-definitions database.
    #[error("EPSG:{0} is not in the CRS definitions database")]
    UnknownCrs(u16),

    /// The PROJ string for a known EPSG code could not be parsed.
    #[error("invalid projection definition for EPSG:{epsg}: {reason}")]
    InvalidProjection {
        /// EPSG code of the offending definition.
        epsg: u16,
        /// Parser error text.
        reason: String,
    },

    /// A coordinate was NaN or infinite before or after transformation.
    #[error("non-finite coordinate ({x}, {y})")]
    NonFiniteCoordinate {
        /// X / easting / longitude value.
        x: f64,
        /// Y / northing / latitude value.
        y: f64,
    },

    /// The underlying projection transform failed.
    #[error("projection transform failed: {0}")]
    Transform(String),
}
