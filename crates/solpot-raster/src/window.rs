//! Pixel windows and the raster data read from them.

use geo::Rect;

use crate::Affine;

/// A rectangular pixel region of a raster, clamped to the raster's extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelWindow {
    /// First column.
    pub col_off: i64,
    /// First row.
    pub row_off: i64,
    /// Width in pixels.
    pub width: usize,
    /// Height in pixels.
    pub height: usize,
}

impl PixelWindow {
    /// Compute the pixel window covering projected `bounds` on a raster
    /// with the given full transform and dimensions.
    ///
    /// Fractional pixel positions are rounded *outward* (floor on the
    /// minimum, ceil on the maximum) so pixels partially covered by the
    /// bounds stay inside the window; truncation would clip edge pixels.
    /// The window is then clamped to the raster. Returns `None` when the
    /// overlap is empty.
    pub fn from_bounds(
        bounds: &Rect<f64>,
        transform: &Affine,
        raster_width: u32,
        raster_height: u32,
    ) -> Option<Self> {
        // Map all four corners: the y axis flips under north-up transforms
        // and a rotated transform could flip either.
        let corners = [
            transform.geo_to_px(bounds.min().x, bounds.min().y)?,
            transform.geo_to_px(bounds.min().x, bounds.max().y)?,
            transform.geo_to_px(bounds.max().x, bounds.min().y)?,
            transform.geo_to_px(bounds.max().x, bounds.max().y)?,
        ];

        let min_col = corners.iter().map(|c| c.0).fold(f64::INFINITY, f64::min);
        let max_col = corners.iter().map(|c| c.0).fold(f64::NEG_INFINITY, f64::max);
        let min_row = corners.iter().map(|c| c.1).fold(f64::INFINITY, f64::min);
        let max_row = corners.iter().map(|c| c.1).fold(f64::NEG_INFINITY, f64::max);

        let col0 = (min_col.floor() as i64).max(0);
        let row0 = (min_row.floor() as i64).max(0);
        let col1 = (max_col.ceil() as i64).min(i64::from(raster_width));
        let row1 = (max_row.ceil() as i64).min(i64::from(raster_height));

        if col1 <= col0 || row1 <= row0 {
            return None;
        }

        Some(Self {
            col_off: col0,
            row_off: row0,
            width: (col1 - col0) as usize,
            height: (row1 - row0) as usize,
        })
    }
}

/// Pixel data read from one window of a raster tile.
///
/// Ephemeral: produced by a single read, consumed by one extraction step.
/// `transform` maps *this window's* pixel grid to projected coordinates.
/// Band values are interleaved per pixel.
#[derive(Debug, Clone)]
pub struct RasterWindow<T> {
    /// Interleaved pixel data, `width * height * bands` values.
    pub data: Vec<T>,
    /// Width in pixels.
    pub width: usize,
    /// Height in pixels.
    pub height: usize,
    /// Number of bands.
    pub bands: usize,
    /// Pixel-to-projected transform of this window.
    pub transform: Affine,
}

impl<T: Copy> RasterWindow<T> {
    /// A zero-area window, the valid result of a read entirely outside the
    /// tile. Aggregates over it are zero, not errors.
    pub fn empty(transform: Affine, bands: usize) -> Self {
        Self {
            data: Vec::new(),
            width: 0,
            height: 0,
            bands,
            transform,
        }
    }

    /// Whether the window covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Value of one band at a pixel. Panics on out-of-range indices, like
    /// slice indexing.
    pub fn pixel(&self, col: usize, row: usize, band: usize) -> T {
        debug_assert!(col < self.width && row < self.height && band < self.bands);
        self.data[(row * self.width + col) * self.bands + band]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Coord;

    fn rect(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Rect<f64> {
        Rect::new(Coord { x: min_x, y: min_y }, Coord { x: max_x, y: max_y })
    }

    // A 100x100 raster at 0.5 m/px with top-left at (0, 50).
    fn transform() -> Affine {
        Affine::north_up(0.0, 50.0, 0.5)
    }

    #[test]
    fn aligned_bounds_map_exactly() {
        let w = PixelWindow::from_bounds(&rect(10.0, 40.0, 20.0, 45.0), &transform(), 100, 100)
            .unwrap();
        assert_eq!(w.col_off, 20);
        assert_eq!(w.width, 20);
        // y = 40..45 is rows 10..20.
        assert_eq!(w.row_off, 10);
        assert_eq!(w.height, 10);
    }

    #[test]
    fn fractional_bounds_round_outward() {
        let w = PixelWindow::from_bounds(&rect(10.1, 40.0, 10.4, 40.3), &transform(), 100, 100)
            .unwrap();
        // Columns 20.2..20.8 must cover the whole pixel 20.
        assert_eq!(w.col_off, 20);
        assert_eq!(w.width, 1);
        // Rows 19.4..20.0 cover pixel 19.
        assert_eq!(w.row_off, 19);
        assert_eq!(w.height, 1);
    }

    #[test]
    fn clamped_at_tile_edge() {
        let w = PixelWindow::from_bounds(&rect(-5.0, 48.0, 2.0, 55.0), &transform(), 100, 100)
            .unwrap();
        assert_eq!(w.col_off, 0);
        assert_eq!(w.row_off, 0);
        assert_eq!(w.width, 4);
        assert_eq!(w.height, 4);
    }

    #[test]
    fn disjoint_bounds_yield_no_window() {
        assert!(
            PixelWindow::from_bounds(&rect(1000.0, 1000.0, 1010.0, 1010.0), &transform(), 100, 100)
                .is_none()
        );
    }

    #[test]
    fn empty_window_reports_zero_pixels() {
        let w: RasterWindow<f32> = RasterWindow::empty(transform(), 1);
        assert!(w.is_empty());
        assert_eq!(w.data.len(), 0);
    }
}
