//! Error types for tile indexing and storage.

use thiserror::Error;

/// Errors that can occur when indexing, locating or fetching tiles.
#[derive(Debug, Error)]
pub enum TileError {
    /// I/O error reading a catalog or writing to the cache.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed catalog file. Fatal: indicates corrupt source data.
    #[error("invalid tile catalog {path}: {reason}")]
    Catalog {
        /// Catalog file path.
        path: String,
        /// What went wrong.
        reason: String,
    },

    /// A tile name does not follow the expected grid naming convention.
    #[error("invalid tile name: {0}")]
    InvalidTileName(String),

    /// No cataloged tile contains the point. Expected at region edges.
    #[error("no tile found for point ({x}, {y})")]
    NoTileFound {
        /// Easting in projected meters.
        x: f64,
        /// Northing in projected meters.
        y: f64,
    },

    /// More than one tile contains the point. Tiles are non-overlapping by
    /// construction, so this means the catalog is corrupt; callers must
    /// abort rather than pick one.
    #[error("multiple tiles {names:?} contain point ({x}, {y}); catalog is corrupt")]
    AmbiguousTile {
        /// Easting in projected meters.
        x: f64,
        /// Northing in projected meters.
        y: f64,
        /// The conflicting tile names.
        names: Vec<String>,
    },

    /// The remote store has no object for this tile (HTTP 404). Permanent:
    /// catalog and remote disagree.
    #[error("tile {name} missing from remote store (HTTP {status})")]
    RemoteMissing {
        /// Tile name.
        name: String,
        /// HTTP status code.
        status: u16,
    },

    /// Transport-level failure while fetching a tile. Retryable by the
    /// caller with backoff.
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// The download completed abnormally (non-success HTTP status other
    /// than 404).
    #[error("failed to download tile {name}: {reason}")]
    Download {
        /// Tile name.
        name: String,
        /// Reason for failure.
        reason: String,
    },
}

impl TileError {
    /// Whether retrying the operation could succeed.
    ///
    /// Transport errors (timeouts, connection resets) are transient; a 404
    /// or a corrupt catalog will not fix itself.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TileError::Http(_) | TileError::Download { .. })
    }
}
