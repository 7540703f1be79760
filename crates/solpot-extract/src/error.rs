//! Pipeline error type and batch fatality classification.

use solpot_tiles::TileError;
use thiserror::Error;

/// Errors raised by the extraction pipelines.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// I/O error reading inputs or writing outputs.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Coordinate transform failure.
    #[error(transparent)]
    Geom(#[from] solpot_geom::GeomError),

    /// Tile lookup, catalog or download failure.
    #[error(transparent)]
    Tile(#[from] TileError),

    /// Raster read or aggregation failure.
    #[error(transparent)]
    Raster(#[from] solpot_raster::RasterError),

    /// CSV read/write failure.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// PNG encoding failure.
    #[error("image encoding error: {0}")]
    Image(#[from] image::ImageError),

    /// The footprint source could not be parsed.
    #[error("footprint source `{path}`: {reason}")]
    Footprints {
        /// Source file path.
        path: String,
        /// What went wrong.
        reason: String,
    },

    /// A geometry with no area or centroid.
    #[error("empty geometry for `{0}`")]
    EmptyGeometry(String),
}

impl ExtractError {
    /// Whether this failure must abort the whole batch.
    ///
    /// An ambiguous tile or a broken catalog means the shared tile data is
    /// corrupt; skipping one building and continuing would produce wrong
    /// results for every other building too.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ExtractError::Tile(TileError::AmbiguousTile { .. })
                | ExtractError::Tile(TileError::Catalog { .. })
        )
    }
}
