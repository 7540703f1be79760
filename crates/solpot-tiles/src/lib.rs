//! # solpot-tiles
//!
//! Tile addressing for the NRW open-data raster datasets: parse tile
//! catalogs, answer "which tile contains this point / polygon" queries, and
//! keep a local cache of downloaded tile files.
//!
//! The region is covered by thousands of fixed-size square raster tiles per
//! dataset (aerial imagery plus two irradiance resolutions), each addressed
//! by a name that encodes its grid position in km. A [`TileIndex`] is built
//! once from a catalog file and is immutable afterwards; a [`TileStore`]
//! binds an index to a cache directory and remote base URL per
//! [`DatasetKind`] and performs on-demand, single-flight downloads.
//!
//! ```no_run
//! use solpot_tiles::{DatasetKind, GridTokenScheme, StoreConfig, TileCatalog, TileStore};
//!
//! let catalog = TileCatalog::from_overview_csv("data/dop_nw.csv", &GridTokenScheme::default())?;
//! let store = TileStore::new(
//!     catalog.into_index(),
//!     StoreConfig {
//!         kind: DatasetKind::AerialImage,
//!         cache_dir: "data/aerial".into(),
//!         base_url: "https://www.opengeodata.nrw.de/produkte/geobasis/lusat/akt/dop".into(),
//!     },
//! )?;
//!
//! let name = store.index().locate_by_point(478_500.0, 5_739_500.0)?;
//! let path = store.ensure_available(name, false)?;
//! println!("tile at {}", path.display());
//! # Ok::<(), solpot_tiles::TileError>(())
//! ```

mod catalog;
mod error;
mod index;
mod store;

pub use catalog::{
    bounds_from_tile_name, CatalogEntry, GridTokenScheme, StrippedPrefixScheme, TileCatalog,
    TileFootprint, TileIdScheme,
};
pub use error::TileError;
pub use index::TileIndex;
pub use store::{DatasetKind, DownloadStats, StoreConfig, TileStore};

/// Result type for tile operations.
pub type Result<T> = std::result::Result<T, TileError>;
