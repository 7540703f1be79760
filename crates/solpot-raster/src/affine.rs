//! 6-parameter affine transform between pixel and projected coordinates.

/// Affine transform mapping pixel (col, row) to projected (x, y):
///
/// ```text
/// x = a * col + b * row + c
/// y = d * col + e * row + f
/// ```
///
/// For the north-up rasters used here, `b` and `d` are zero, `a` is the
/// pixel width in meters, `e` the negative pixel height, and `(c, f)` the
/// projected coordinates of the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    /// Pixel width component.
    pub a: f64,
    /// Row rotation component.
    pub b: f64,
    /// X origin (top-left corner).
    pub c: f64,
    /// Column rotation component.
    pub d: f64,
    /// Pixel height component (negative for north-up).
    pub e: f64,
    /// Y origin (top-left corner).
    pub f: f64,
}

impl Affine {
    /// North-up transform from a top-left origin and pixel size in meters.
    pub fn north_up(origin_x: f64, origin_y: f64, pixel_size: f64) -> Self {
        Self {
            a: pixel_size,
            b: 0.0,
            c: origin_x,
            d: 0.0,
            e: -pixel_size,
            f: origin_y,
        }
    }

    /// Projected coordinates of a (fractional) pixel position.
    pub fn px_to_geo(&self, col: f64, row: f64) -> (f64, f64) {
        (
            self.a * col + self.b * row + self.c,
            self.d * col + self.e * row + self.f,
        )
    }

    /// Fractional pixel position of a projected coordinate, via the inverse
    /// transform. `None` if the transform is degenerate.
    pub fn geo_to_px(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let det = self.a * self.e - self.b * self.d;
        if det.abs() < f64::EPSILON {
            return None;
        }
        let dx = x - self.c;
        let dy = y - self.f;
        Some((
            (self.e * dx - self.b * dy) / det,
            (self.a * dy - self.d * dx) / det,
        ))
    }

    /// Transform of a sub-window starting at pixel `(col_off, row_off)`.
    ///
    /// Composes the pixel offset into the origin so that the window's own
    /// pixel (0, 0) maps to the right projected location. Everything
    /// rasterized against a cropped window must use this, not the full-tile
    /// transform.
    pub fn for_window(&self, col_off: i64, row_off: i64) -> Self {
        let (c, f) = self.px_to_geo(col_off as f64, row_off as f64);
        Self { c, f, ..*self }
    }

    /// Ground area covered by one pixel, in m².
    pub fn pixel_area(&self) -> f64 {
        (self.a * self.e - self.b * self.d).abs()
    }

    /// Row-major flat form `[a, b, c, d, e, f]`, for serialization in
    /// overview records. Inverse of [`Affine::from_flat`].
    pub fn to_flat(&self) -> [f64; 6] {
        [self.a, self.b, self.c, self.d, self.e, self.f]
    }

    /// Rebuild from the flat form produced by [`Affine::to_flat`].
    pub fn from_flat(t: [f64; 6]) -> Self {
        Self {
            a: t[0],
            b: t[1],
            c: t[2],
            d: t[3],
            e: t[4],
            f: t[5],
        }
    }
}
