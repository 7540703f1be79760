//! Immutable spatial index over tile footprints.

use geo::{Intersects, Polygon};
use rstar::{RTree, RTreeObject, AABB};

use crate::{CatalogEntry, Result, TileError, TileFootprint};

/// A tile stored in the R-tree with its precomputed envelope.
#[derive(Debug)]
struct IndexedTile {
    name: String,
    footprint: TileFootprint,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedTile {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Spatial index mapping tile names to their square extents.
///
/// Built once from a catalog at the start of a batch job and immutable
/// afterwards; lookups are side-effect free and safe to share across
/// worker threads.
#[derive(Debug)]
pub struct TileIndex {
    tree: RTree<IndexedTile>,
}

impl TileIndex {
    /// Bulk-load the index from catalog entries.
    pub fn build(entries: Vec<CatalogEntry>) -> Self {
        let tiles = entries
            .into_iter()
            .map(|e| {
                let fp = e.footprint;
                IndexedTile {
                    name: e.name,
                    footprint: fp,
                    envelope: AABB::from_corners(
                        [fp.min_x, fp.min_y],
                        [fp.min_x + fp.extent, fp.min_y + fp.extent],
                    ),
                }
            })
            .collect();
        Self {
            tree: RTree::bulk_load(tiles),
        }
    }

    /// Number of indexed tiles.
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Whether the index holds no tiles.
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Footprint of a tile by name, if cataloged.
    pub fn footprint(&self, name: &str) -> Option<TileFootprint> {
        self.tree
            .iter()
            .find(|t| t.name == name)
            .map(|t| t.footprint)
    }

    /// Name of the tile containing the point, in projected meters.
    ///
    /// Containment is half-open (`min <= v < min + extent`), so a point on
    /// a shared edge belongs to exactly one tile. Zero matches is
    /// [`TileError::NoTileFound`]; more than one is
    /// [`TileError::AmbiguousTile`] and means the catalog is corrupt.
    pub fn locate_by_point(&self, x: f64, y: f64) -> Result<&str> {
        let query = AABB::from_point([x, y]);
        let mut matches = self
            .tree
            .locate_in_envelope_intersecting(&query)
            .filter(|t| t.footprint.contains(x, y));

        let first = matches.next().ok_or(TileError::NoTileFound { x, y })?;
        let extra: Vec<&IndexedTile> = matches.collect();
        if !extra.is_empty() {
            let mut names = vec![first.name.clone()];
            names.extend(extra.iter().map(|t| t.name.clone()));
            names.sort();
            return Err(TileError::AmbiguousTile { x, y, names });
        }
        Ok(&first.name)
    }

    /// Names of all tiles whose extent intersects the polygon.
    ///
    /// An empty result is valid and signals "no coverage here". Sorted for
    /// deterministic iteration.
    pub fn locate_by_polygon(&self, polygon: &Polygon<f64>) -> Vec<&str> {
        use geo::BoundingRect;

        let Some(bounds) = polygon.bounding_rect() else {
            return Vec::new();
        };
        let query = AABB::from_corners(
            [bounds.min().x, bounds.min().y],
            [bounds.max().x, bounds.max().y],
        );

        let mut names: Vec<&str> = self
            .tree
            .locate_in_envelope_intersecting(&query)
            .filter(|t| polygon.intersects(&t.footprint.to_rect()))
            .map(|t| t.name.as_str())
            .collect();
        names.sort_unstable();
        names
    }
}
