//! Per-dataset tile store: local cache directory plus remote base URL.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex};
use std::time::Duration;

use crate::{Result, TileError, TileIndex};

/// HTTP timeout for tile downloads. Energy tiles are tens of MB; aerial
/// imagery tiles can exceed 100 MB.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// The raster datasets this pipeline consumes.
///
/// Closed enum instead of ambient string-keyed maps so the extension and
/// pixel-size table is checked at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetKind {
    /// 10 cm RGBI aerial orthophotos, mirrored as GeoTIFF.
    AerialImage,
    /// Annual irradiance at 50 cm ground resolution (GeoTIFF, kWh/m²).
    EnergyYield50Cm,
    /// Annual irradiance at 100 cm ground resolution (GeoTIFF, kWh/m²).
    EnergyYield100Cm,
}

impl DatasetKind {
    /// File extension used by the remote store for this dataset.
    pub fn file_extension(&self) -> &'static str {
        "tif"
    }

    /// Ground size of one pixel in meters.
    pub fn pixel_size_m(&self) -> f64 {
        match self {
            DatasetKind::AerialImage => 0.1,
            DatasetKind::EnergyYield50Cm => 0.5,
            DatasetKind::EnergyYield100Cm => 1.0,
        }
    }

    /// Ground area of one pixel in m², for converting per-pixel kWh/m²
    /// readings into kWh.
    pub fn pixel_area_sqm(&self) -> f64 {
        let s = self.pixel_size_m();
        s * s
    }
}

/// Configuration binding a store to one dataset.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Which dataset this store serves.
    pub kind: DatasetKind,
    /// Directory for downloaded tile files.
    pub cache_dir: PathBuf,
    /// Remote base URL; tile URLs are `base_url/{name}.{ext}`.
    pub base_url: String,
}

/// Download statistics for the store.
#[derive(Debug, Clone, Copy, Default)]
pub struct DownloadStats {
    /// Number of tiles downloaded this session.
    pub tiles_downloaded: usize,
    /// Total bytes downloaded this session.
    pub bytes_downloaded: u64,
}

/// Caching tile store for one dataset.
///
/// The local cache is append-only: a tile, once downloaded, is never
/// re-fetched unless `overwrite` is set. Concurrent callers are safe:
/// different tiles download in parallel, and multiple threads requesting
/// the same tile share at most one in-flight download.
pub struct TileStore {
    index: TileIndex,
    config: StoreConfig,
    client: reqwest::blocking::Client,
    /// Tile names with a download currently in flight.
    in_flight: Mutex<HashSet<String>>,
    /// Condition variable for waiting on downloads.
    download_done: Condvar,
    tiles_downloaded: AtomicUsize,
    bytes_downloaded: AtomicU64,
}

impl std::fmt::Debug for TileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileStore")
            .field("kind", &self.config.kind)
            .field("cache_dir", &self.config.cache_dir)
            .field("tiles", &self.index.len())
            .finish()
    }
}

impl TileStore {
    /// Create a store over a built index. Creates the cache directory if
    /// absent.
    pub fn new(index: TileIndex, config: StoreConfig) -> Result<Self> {
        fs::create_dir_all(&config.cache_dir)?;

        let client = reqwest::blocking::Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .build()?;

        Ok(Self {
            index,
            config,
            client,
            in_flight: Mutex::new(HashSet::new()),
            download_done: Condvar::new(),
            tiles_downloaded: AtomicUsize::new(0),
            bytes_downloaded: AtomicU64::new(0),
        })
    }

    /// The spatial index this store serves.
    pub fn index(&self) -> &TileIndex {
        &self.index
    }

    /// Which dataset this store serves.
    pub fn kind(&self) -> DatasetKind {
        self.config.kind
    }

    /// Tile filename including the dataset's extension.
    pub fn tile_filename(&self, name: &str) -> String {
        format!("{name}.{}", self.config.kind.file_extension())
    }

    /// Local cache path for a tile.
    pub fn tile_path(&self, name: &str) -> PathBuf {
        self.config.cache_dir.join(self.tile_filename(name))
    }

    /// Remote URL for a tile.
    pub fn tile_url(&self, name: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.tile_filename(name)
        )
    }

    /// Whether the tile is present in the local cache.
    pub fn exists_locally(&self, name: &str) -> bool {
        self.tile_path(name).exists()
    }

    /// Download statistics for this session.
    pub fn download_stats(&self) -> DownloadStats {
        DownloadStats {
            tiles_downloaded: self.tiles_downloaded.load(Ordering::Relaxed),
            bytes_downloaded: self.bytes_downloaded.load(Ordering::Relaxed),
        }
    }

    /// Ensure a tile is present locally, downloading it if needed.
    ///
    /// Returns the local path. Thread-safe with at most one fetch in
    /// flight per tile name: the first caller downloads while the others
    /// wait on the result. A failed download is not retried here; retry
    /// policy belongs to the batch level, since a missing remote tile is
    /// usually a permanent catalog/remote mismatch.
    ///
    /// Partial downloads never become visible: bytes stream to a `.part`
    /// sibling which is renamed into place only after the body completed.
    pub fn ensure_available(&self, name: &str, overwrite: bool) -> Result<PathBuf> {
        let cache_path = self.tile_path(name);

        if !overwrite && cache_path.exists() {
            return Ok(cache_path);
        }

        // Claim the download slot for this tile, waiting out any fetch
        // already in flight. The owner removes its own entry when done, so
        // the set never carries state between calls: a waiter that wakes to
        // find the file present returns it, and one that finds it absent
        // (the fetch failed, or `overwrite` is set) claims the slot and
        // fetches itself, surfacing its own typed error.
        {
            let mut in_flight = self.in_flight.lock().unwrap();
            while in_flight.contains(name) {
                in_flight = self.download_done.wait(in_flight).unwrap();
            }
            if !overwrite && cache_path.exists() {
                return Ok(cache_path);
            }
            in_flight.insert(name.to_string());
        }

        let result = self.download_to_cache(name, &cache_path);

        {
            let mut in_flight = self.in_flight.lock().unwrap();
            in_flight.remove(name);
        }
        self.download_done.notify_all();

        result
    }

    fn download_to_cache(&self, name: &str, cache_path: &Path) -> Result<PathBuf> {
        if let Some(parent) = cache_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let url = self.tile_url(name);
        tracing::info!(tile = name, url = %url, "downloading tile");

        let mut response = self.client.get(&url).send()?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(TileError::RemoteMissing {
                name: name.to_string(),
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            return Err(TileError::Download {
                name: name.to_string(),
                reason: format!("HTTP {status}"),
            });
        }

        // Stream to a temp path, rename into place when complete.
        let part_path = cache_path.with_extension(format!(
            "{}.part",
            self.config.kind.file_extension()
        ));
        let bytes = {
            let mut file = fs::File::create(&part_path)?;
            match std::io::copy(&mut response, &mut file) {
                Ok(n) => n,
                Err(e) => {
                    drop(file);
                    let _ = fs::remove_file(&part_path);
                    return Err(e.into());
                }
            }
        };
        fs::rename(&part_path, cache_path)?;

        self.tiles_downloaded.fetch_add(1, Ordering::Relaxed);
        self.bytes_downloaded.fetch_add(bytes, Ordering::Relaxed);
        tracing::info!(tile = name, bytes, "download complete");

        Ok(cache_path.to_path_buf())
    }
}
