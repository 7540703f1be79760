//! Tile catalog parsing and the tile-name → footprint naming schemes.
//!
//! Two catalog sources exist in practice:
//!
//! - the official overview CSV (semicolon separated, five metadata lines
//!   before the header, tile names like `dop10rgbi_32_478_5740_1_nw_2024`),
//! - file listings scraped from the download portal (comma separated, a
//!   `File` column, names like
//!   `Strahlungsenergie-NRW-KWh-Yr-Shd-50cm-V23_32280_5648_4.tif`).
//!
//! Both encode the tile's grid position in the name itself, but with
//! different token layouts. The parsing lives behind [`TileIdScheme`] so a
//! catalog format names its scheme explicitly instead of sniffing.

use std::fs;
use std::path::Path;

use geo::{Coord, Rect};
use serde::Deserialize;

use crate::{Result, TileError};

/// Axis-aligned square extent of one tile in projected meters.
///
/// The tile covers the half-open square `[min_x, min_x + extent) x
/// [min_y, min_y + extent)`. Half-open containment keeps a point on a
/// shared edge inside exactly one tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileFootprint {
    /// Easting of the lower-left corner.
    pub min_x: f64,
    /// Northing of the lower-left corner.
    pub min_y: f64,
    /// Side length in meters.
    pub extent: f64,
}

impl TileFootprint {
    /// Half-open containment test.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x
            && x < self.min_x + self.extent
            && y >= self.min_y
            && y < self.min_y + self.extent
    }

    /// The footprint as a closed rectangle for intersection tests.
    pub fn to_rect(&self) -> Rect<f64> {
        Rect::new(
            Coord {
                x: self.min_x,
                y: self.min_y,
            },
            Coord {
                x: self.min_x + self.extent,
                y: self.min_y + self.extent,
            },
        )
    }
}

/// One catalog row: a tile name and its footprint.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    /// Tile name without file extension.
    pub name: String,
    /// Square extent in projected meters.
    pub footprint: TileFootprint,
}

/// Strategy for deriving a tile's footprint from its name.
///
/// One implementation per observed naming convention; catalogs pick their
/// scheme explicitly.
pub trait TileIdScheme: Send + Sync {
    /// Parse the footprint encoded in `name`.
    fn footprint_from_name(&self, name: &str) -> Result<TileFootprint>;
}

/// Grid coordinates at fixed underscore-token positions.
///
/// `dop10rgbi_32_478_5740_1_nw_2024` → x 478 km, y 5740 km, extent 1 km.
/// The token offset is configurable because some products carry extra
/// leading tokens.
#[derive(Debug, Clone, Copy)]
pub struct GridTokenScheme {
    /// Index of the x-km token after splitting on `_`.
    pub x_token: usize,
}

impl Default for GridTokenScheme {
    fn default() -> Self {
        // Matches the dop10rgbi products: tokens 2..=4 are x, y, extent.
        Self { x_token: 2 }
    }
}

impl TileIdScheme for GridTokenScheme {
    fn footprint_from_name(&self, name: &str) -> Result<TileFootprint> {
        let stem = strip_extension(name);
        let tokens: Vec<&str> = stem.split('_').collect();
        if tokens.len() < self.x_token + 3 {
            return Err(TileError::InvalidTileName(name.to_string()));
        }
        footprint_from_km_tokens(
            tokens[self.x_token],
            tokens[self.x_token + 1],
            tokens[self.x_token + 2],
            name,
        )
    }
}

/// Grid coordinates with the known-erroneous duplicated leading digit pair.
///
/// The irradiance products glue the UTM zone prefix onto the x token:
/// `Strahlungsenergie-NRW-KWh-Yr-Shd-50cm-V23_32280_5648_4` carries
/// `32280` where `32_280` was meant. This scheme strips the leading `32`
/// from the first token. The rule is specific to these products' naming
/// mistake and must not be assumed to hold for other catalogs.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrippedPrefixScheme;

impl TileIdScheme for StrippedPrefixScheme {
    fn footprint_from_name(&self, name: &str) -> Result<TileFootprint> {
        let stem = strip_extension(name);
        let tokens: Vec<&str> = stem.split('_').collect();
        if tokens.len() < 4 {
            return Err(TileError::InvalidTileName(name.to_string()));
        }
        let x_km = tokens[1]
            .strip_prefix("32")
            .ok_or_else(|| TileError::InvalidTileName(name.to_string()))?;
        footprint_from_km_tokens(x_km, tokens[2], tokens[3], name)
    }
}

/// Derive a footprint from a bare grid name like `478_5740_1`.
///
/// Used for tiles addressed algorithmically when no catalog row exists.
pub fn bounds_from_tile_name(name: &str) -> Result<TileFootprint> {
    let tokens: Vec<&str> = strip_extension(name).split('_').collect();
    if tokens.len() != 3 {
        return Err(TileError::InvalidTileName(name.to_string()));
    }
    footprint_from_km_tokens(tokens[0], tokens[1], tokens[2], name)
}

fn footprint_from_km_tokens(x: &str, y: &str, extent: &str, name: &str) -> Result<TileFootprint> {
    let parse = |t: &str| -> Result<f64> {
        t.parse::<u32>()
            .map(|v| f64::from(v) * 1000.0)
            .map_err(|_| TileError::InvalidTileName(name.to_string()))
    };
    Ok(TileFootprint {
        min_x: parse(x)?,
        min_y: parse(y)?,
        extent: parse(extent)?,
    })
}

/// Strip a trailing `.ext` file extension if present.
fn strip_extension(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) => {
            stem
        }
        _ => name,
    }
}

/// A parsed tile catalog, ready to be turned into a [`crate::TileIndex`].
#[derive(Debug, Clone)]
pub struct TileCatalog {
    entries: Vec<CatalogEntry>,
}

/// Number of metadata lines before the header in the official overview CSV.
const OVERVIEW_METADATA_LINES: usize = 5;

#[derive(Debug, Deserialize)]
struct ExplicitRow {
    tile_name: String,
    min_x: f64,
    min_y: f64,
    extent: f64,
}

impl TileCatalog {
    /// Parse the official overview CSV (`dop_nw.csv` style): semicolon
    /// separated, five metadata lines, tile names in the `Kachelname`
    /// column, footprints encoded in the names.
    pub fn from_overview_csv<P: AsRef<Path>>(
        path: P,
        scheme: &dyn TileIdScheme,
    ) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let data = skip_lines(&content, OVERVIEW_METADATA_LINES);
        Self::parse_delimited(data, b';', "Kachelname", scheme, path)
    }

    /// Parse a scraped file-listing CSV: comma separated, tile filenames in
    /// the `File` column, footprints encoded in the names via `scheme`.
    pub fn from_file_listing_csv<P: AsRef<Path>>(
        path: P,
        scheme: &dyn TileIdScheme,
    ) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        Self::parse_delimited(&content, b',', "File", scheme, path)
    }

    /// Parse a catalog with explicit `tile_name,min_x,min_y,extent` columns
    /// in meters. No naming scheme involved.
    pub fn from_explicit_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = csv::Reader::from_path(path).map_err(|e| TileError::Catalog {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let mut entries = Vec::new();
        for row in reader.deserialize::<ExplicitRow>() {
            let row = row.map_err(|e| TileError::Catalog {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
            entries.push(CatalogEntry {
                name: strip_extension(&row.tile_name).to_string(),
                footprint: TileFootprint {
                    min_x: row.min_x,
                    min_y: row.min_y,
                    extent: row.extent,
                },
            });
        }
        Self::from_entries(entries, path)
    }

    fn parse_delimited(
        data: &str,
        delimiter: u8,
        name_column: &str,
        scheme: &dyn TileIdScheme,
        path: &Path,
    ) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .from_reader(data.as_bytes());

        let name_idx = reader
            .headers()
            .map_err(|e| TileError::Catalog {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?
            .iter()
            .position(|h| h.trim() == name_column)
            .ok_or_else(|| TileError::Catalog {
                path: path.display().to_string(),
                reason: format!("missing column `{name_column}`"),
            })?;

        let mut entries = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| TileError::Catalog {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
            let Some(raw_name) = record.get(name_idx) else {
                continue;
            };
            let raw_name = raw_name.trim();
            if raw_name.is_empty() {
                continue;
            }
            let footprint = scheme.footprint_from_name(raw_name)?;
            entries.push(CatalogEntry {
                name: strip_extension(raw_name).to_string(),
                footprint,
            });
        }
        Self::from_entries(entries, path)
    }

    fn from_entries(entries: Vec<CatalogEntry>, path: &Path) -> Result<Self> {
        if entries.is_empty() {
            return Err(TileError::Catalog {
                path: path.display().to_string(),
                reason: "catalog contains no tiles".to_string(),
            });
        }
        Ok(Self { entries })
    }

    /// The parsed entries.
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Consume the catalog and build the immutable spatial index.
    pub fn into_index(self) -> crate::TileIndex {
        crate::TileIndex::build(self.entries)
    }
}

fn skip_lines(content: &str, n: usize) -> &str {
    let mut rest = content;
    for _ in 0..n {
        match rest.split_once('\n') {
            Some((_, tail)) => rest = tail,
            None => return "",
        }
    }
    rest
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_token_scheme_parses_dop_names() {
        let scheme = GridTokenScheme::default();
        let fp = scheme
            .footprint_from_name("dop10rgbi_32_478_5740_1_nw_2024")
            .unwrap();
        assert_eq!(
            fp,
            TileFootprint {
                min_x: 478_000.0,
                min_y: 5_740_000.0,
                extent: 1_000.0
            }
        );

        // With extension, as found in file listings.
        let fp = scheme
            .footprint_from_name("dop10rgbi_32_32280_5648_4_nw_2024.tif")
            .unwrap();
        assert_eq!(fp.min_y, 5_648_000.0);
        assert_eq!(fp.extent, 4_000.0);
    }

    #[test]
    fn stripped_prefix_scheme_parses_energy_names() {
        let scheme = StrippedPrefixScheme;
        let fp = scheme
            .footprint_from_name("Strahlungsenergie-NRW-KWh-Yr-Shd-50cm-V23_32280_5648_4.tif")
            .unwrap();
        assert_eq!(
            fp,
            TileFootprint {
                min_x: 280_000.0,
                min_y: 5_648_000.0,
                extent: 4_000.0
            }
        );
    }

    #[test]
    fn stripped_prefix_requires_the_duplicated_pair() {
        let scheme = StrippedPrefixScheme;
        let err = scheme
            .footprint_from_name("Strahlungsenergie_280_5648_4.tif")
            .unwrap_err();
        assert!(matches!(err, TileError::InvalidTileName(_)));
    }

    #[test]
    fn bare_grid_names() {
        let fp = bounds_from_tile_name("478_5740_1").unwrap();
        assert_eq!(fp.min_x, 478_000.0);
        assert_eq!(fp.min_y, 5_740_000.0);
        assert_eq!(fp.extent, 1_000.0);

        assert!(bounds_from_tile_name("478_5740").is_err());
        assert!(bounds_from_tile_name("a_b_c").is_err());
    }

    #[test]
    fn half_open_containment() {
        let fp = TileFootprint {
            min_x: 0.0,
            min_y: 0.0,
            extent: 1000.0,
        };
        assert!(fp.contains(0.0, 0.0));
        assert!(fp.contains(999.999, 500.0));
        assert!(!fp.contains(1000.0, 500.0));
        assert!(!fp.contains(-0.001, 500.0));
    }

    const OVERVIEW_CSV: &str = "\
Metadaten der DOP10 fuer die Datenabgabe
Land;Nordrhein-Westfalen
Eigentuemer;Land NRW
Stand;2025-01-23
Version Regelwerk;V4.0
Kachelname;Erfassungsmethode;Aktualitaet
dop10rgbi_32_478_5740_1_nw_2024;0;2024-04-06
dop10rgbi_32_478_5739_1_nw_2024;0;2024-04-06
";

    #[test]
    fn overview_csv_parses_after_metadata_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dop_nw.csv");
        std::fs::write(&path, OVERVIEW_CSV).unwrap();

        let catalog =
            TileCatalog::from_overview_csv(&path, &GridTokenScheme::default()).unwrap();
        assert_eq!(catalog.entries().len(), 2);
        assert_eq!(catalog.entries()[0].name, "dop10rgbi_32_478_5740_1_nw_2024");
        assert_eq!(catalog.entries()[1].footprint.min_y, 5_739_000.0);
    }

    #[test]
    fn file_listing_csv_with_energy_scheme() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("energy_50cm.csv");
        std::fs::write(
            &path,
            "File,Size\n\
             Strahlungsenergie-NRW-KWh-Yr-Shd-50cm-V23_32280_5648_4.tif,12345\n",
        )
        .unwrap();

        let catalog = TileCatalog::from_file_listing_csv(&path, &StrippedPrefixScheme).unwrap();
        assert_eq!(catalog.entries().len(), 1);
        // Names are stored without the file extension.
        assert_eq!(
            catalog.entries()[0].name,
            "Strahlungsenergie-NRW-KWh-Yr-Shd-50cm-V23_32280_5648_4"
        );
        assert_eq!(catalog.entries()[0].footprint.min_x, 280_000.0);
    }

    #[test]
    fn empty_catalog_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        std::fs::write(&path, "File,Size\n").unwrap();

        let err = TileCatalog::from_file_listing_csv(&path, &StrippedPrefixScheme).unwrap_err();
        assert!(matches!(err, TileError::Catalog { .. }));
    }
}
