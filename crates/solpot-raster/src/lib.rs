//! # solpot-raster
//!
//! Raster access for the extraction pipelines: open a GeoTIFF tile, read
//! only the pixel sub-window overlapping a projected bounding box, and
//! rasterize building polygons into that window's exact pixel grid.
//!
//! The key contract is alignment: [`RasterTile::read_window_f32`] returns
//! both the pixels and the [`Affine`] transform of the *cropped* window, and
//! [`rasterize`] produces masks against that same transform, so per-pixel
//! values can be masked and aggregated without resampling.
//!
//! ```no_run
//! use geo::{polygon, Rect, Coord};
//! use solpot_raster::{masked_sum, rasterize, RasterTile};
//!
//! let mut tile = RasterTile::open("cache/280_5648_4.tif")?;
//! let bounds = Rect::new(
//!     Coord { x: 280_100.0, y: 5_648_100.0 },
//!     Coord { x: 280_120.0, y: 5_648_120.0 },
//! );
//! let window = tile.read_window_f32(&bounds)?;
//! let roof = polygon![
//!     (x: 280_105.0, y: 5_648_105.0),
//!     (x: 280_115.0, y: 5_648_105.0),
//!     (x: 280_115.0, y: 5_648_115.0),
//!     (x: 280_105.0, y: 5_648_115.0),
//! ];
//! let mask = rasterize(&roof, window.width, window.height, &window.transform);
//! let agg = masked_sum(&window, &mask)?;
//! println!("{} kWh over {} pixels", agg.sum * 0.25, agg.pixels_covered);
//! # Ok::<(), solpot_raster::RasterError>(())
//! ```

mod affine;
mod error;
mod rasterize;
mod reader;
mod window;

pub use affine::Affine;
pub use error::RasterError;
pub use rasterize::{masked_sum, rasterize, Mask, MaskedSum};
pub use reader::RasterTile;
pub use window::{PixelWindow, RasterWindow};

/// Result type for raster operations.
pub type Result<T> = std::result::Result<T, RasterError>;
