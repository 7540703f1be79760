//! Error types for raster access.

use thiserror::Error;

/// Errors that can occur when reading raster tiles or aggregating masks.
///
/// Decode and geo-tag failures mean the tile file is corrupt or not a
/// GeoTIFF; batch callers skip the affected buildings and continue.
#[derive(Debug, Error)]
pub enum RasterError {
    /// I/O error opening or reading the file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TIFF decoding error.
    #[error("TIFF decode error: {0}")]
    Decode(#[from] tiff::TiffError),

    /// Missing or malformed georeferencing tags.
    #[error("invalid GeoTIFF: {0}")]
    InvalidGeoTiff(String),

    /// The sample format cannot be converted to the requested band type.
    #[error("unsupported TIFF data type: {0}")]
    UnsupportedDataType(String),

    /// Mask and window dimensions disagree.
    #[error("shape mismatch: window {window_width}x{window_height}, mask {mask_width}x{mask_height}")]
    ShapeMismatch {
        /// Window width in pixels.
        window_width: usize,
        /// Window height in pixels.
        window_height: usize,
        /// Mask width in pixels.
        mask_width: usize,
        /// Mask height in pixels.
        mask_height: usize,
    },
}
