//! Polygon rasterization and masked aggregation.

use geo::{BoundingRect, Coord, Intersects, Polygon, Rect};

use crate::{Affine, RasterError, RasterWindow, Result};

/// Boolean pixel mask over a window's grid.
#[derive(Debug, Clone)]
pub struct Mask {
    data: Vec<bool>,
    width: usize,
    height: usize,
}

impl Mask {
    /// Mask width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Mask height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Whether the pixel at `(col, row)` is covered.
    pub fn get(&self, col: usize, row: usize) -> bool {
        self.data[row * self.width + col]
    }

    /// Number of covered pixels.
    pub fn covered_count(&self) -> usize {
        self.data.iter().filter(|&&b| b).count()
    }
}

/// Rasterize a polygon into a `width` x `height` pixel grid described by
/// `transform`.
///
/// All-touched semantics: a pixel is covered when its ground footprint
/// intersects the polygon at all, not only when its center falls inside.
/// Building roofs are small relative to the 50 cm grid, so center sampling
/// would drop a large share of the edge pixels that carry real yield.
pub fn rasterize(polygon: &Polygon<f64>, width: usize, height: usize, transform: &Affine) -> Mask {
    let mut data = vec![false; width * height];

    // Restrict the per-pixel test to the polygon's bounding box.
    let range = polygon
        .bounding_rect()
        .and_then(|b| pixel_range(&b, transform, width, height));

    if let Some((col0, col1, row0, row1)) = range {
        for row in row0..row1 {
            for col in col0..col1 {
                let (x0, y0) = transform.px_to_geo(col as f64, row as f64);
                let (x1, y1) = transform.px_to_geo((col + 1) as f64, (row + 1) as f64);
                let pixel = Rect::new(Coord { x: x0, y: y0 }, Coord { x: x1, y: y1 });
                if polygon.intersects(&pixel) {
                    data[row * width + col] = true;
                }
            }
        }
    }

    Mask {
        data,
        width,
        height,
    }
}

/// Pixel index range `[col0, col1) x [row0, row1)` covering `bounds`,
/// clamped to the grid. `None` when disjoint or the transform is
/// degenerate.
fn pixel_range(
    bounds: &Rect<f64>,
    transform: &Affine,
    width: usize,
    height: usize,
) -> Option<(usize, usize, usize, usize)> {
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
    let col1 = (max_col.ceil() as i64).min(width as i64);
    let row1 = (max_row.ceil() as i64).min(height as i64);

    if col1 <= col0 || row1 <= row0 {
        return None;
    }
    Some((col0 as usize, col1 as usize, row0 as usize, row1 as usize))
}

/// Result of summing a window's first band under a mask.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaskedSum {
    /// Sum of the masked pixel values.
    pub sum: f64,
    /// Number of pixels the mask covers.
    pub pixels_covered: usize,
}

/// Sum the first band of `window` over the covered pixels of `mask`.
///
/// The mask must have been rasterized against this window's transform and
/// dimensions; a shape mismatch means the caller aligned them wrong and is
/// an error, never silently truncated.
pub fn masked_sum(window: &RasterWindow<f32>, mask: &Mask) -> Result<MaskedSum> {
    if window.width != mask.width || window.height != mask.height {
        return Err(RasterError::ShapeMismatch {
            window_width: window.width,
            window_height: window.height,
            mask_width: mask.width,
            mask_height: mask.height,
        });
    }

    let mut sum = 0.0f64;
    let mut pixels_covered = 0usize;
    for row in 0..window.height {
        for col in 0..window.width {
            if mask.get(col, row) {
                sum += f64::from(window.pixel(col, row, 0));
                pixels_covered += 1;
            }
        }
    }

    Ok(MaskedSum {
        sum,
        pixels_covered,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::polygon;

    fn ones_window(width: usize, height: usize, transform: Affine) -> RasterWindow<f32> {
        RasterWindow {
            data: vec![1.0; width * height],
            width,
            height,
            bands: 1,
            transform,
        }
    }

    #[test]
    fn centered_square_covers_sixteen_pixels() {
        // 10x10 grid at 1 m/px over (0,0)..(10,10); the polygon corners sit
        // strictly inside pixels 3 and 6 of each axis.
        let t = Affine::north_up(0.0, 10.0, 1.0);
        let roof = polygon![
            (x: 3.25, y: 3.25),
            (x: 6.75, y: 3.25),
            (x: 6.75, y: 6.75),
            (x: 3.25, y: 6.75),
        ];

        let mask = rasterize(&roof, 10, 10, &t);
        assert_eq!(mask.covered_count(), 16);

        let window = ones_window(10, 10, t);
        let agg = masked_sum(&window, &mask).unwrap();
        assert_eq!(agg.pixels_covered, 16);
        assert_relative_eq!(agg.sum, 16.0);
        assert_relative_eq!(agg.sum * t.pixel_area(), 16.0);
    }

    #[test]
    fn edge_touching_pixels_are_covered() {
        // A sliver crossing a pixel corner still marks the pixels it grazes.
        let t = Affine::north_up(0.0, 4.0, 1.0);
        let sliver = polygon![
            (x: 0.5, y: 0.5),
            (x: 3.5, y: 0.6),
            (x: 3.5, y: 0.4),
        ];
        let mask = rasterize(&sliver, 4, 4, &t);
        // Bottom row of the grid, columns 0..4.
        assert_eq!(mask.covered_count(), 4);
        for col in 0..4 {
            assert!(mask.get(col, 3));
        }
    }

    #[test]
    fn polygon_outside_grid_covers_nothing() {
        let t = Affine::north_up(0.0, 10.0, 1.0);
        let far = polygon![
            (x: 100.0, y: 100.0),
            (x: 110.0, y: 100.0),
            (x: 110.0, y: 110.0),
        ];
        let mask = rasterize(&far, 10, 10, &t);
        assert_eq!(mask.covered_count(), 0);

        let window = ones_window(10, 10, t);
        let agg = masked_sum(&window, &mask).unwrap();
        assert_eq!(agg.pixels_covered, 0);
        assert_relative_eq!(agg.sum, 0.0);
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        let t = Affine::north_up(0.0, 10.0, 1.0);
        let roof = polygon![(x: 1.0, y: 1.0), (x: 2.0, y: 1.0), (x: 2.0, y: 2.0)];
        let mask = rasterize(&roof, 10, 10, &t);
        let window = ones_window(5, 5, t);
        assert!(matches!(
            masked_sum(&window, &mask),
            Err(RasterError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn interior_ring_does_not_uncover_pixels() {
        // A courtyard smaller than a pixel cannot clear any pixel the
        // surrounding roof still touches.
        let t = Affine::north_up(0.0, 10.0, 1.0);
        let outer = polygon![
            (x: 1.25, y: 1.25),
            (x: 8.75, y: 1.25),
            (x: 8.75, y: 8.75),
            (x: 1.25, y: 8.75),
        ];
        let with_hole = Polygon::new(
            outer.exterior().clone(),
            vec![geo::LineString::from(vec![
                (4.9, 4.9),
                (5.1, 4.9),
                (5.1, 5.1),
                (4.9, 5.1),
            ])],
        );
        let mask = rasterize(&with_hole, 10, 10, &t);
        // 1.25..8.75 touches pixels 1..=8 on both axes.
        assert_eq!(mask.covered_count(), 64);
    }
}
