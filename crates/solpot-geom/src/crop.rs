//! Square crop-box construction around building footprints.

use geo::{BoundingRect, Coord, Polygon, Rect};

/// Build a square, axis-aligned box around a footprint with a margin.
///
/// The box is the footprint's envelope grown by `margin_m` on every side,
/// then squared to the larger of its two dimensions around the same center.
/// A square box keeps the image crops uniform regardless of the building's
/// aspect ratio.
///
/// Expects the polygon in projected meters. Returns `None` for an empty
/// polygon (no envelope).
pub fn squared_box_around(footprint: &Polygon<f64>, margin_m: f64) -> Option<Rect<f64>> {
    let envelope = footprint.bounding_rect()?;

    let width = envelope.width() + 2.0 * margin_m;
    let height = envelope.height() + 2.0 * margin_m;
    let half_side = width.max(height) / 2.0;

    let center = envelope.center();
    Some(Rect::new(
        Coord {
            x: center.x - half_side,
            y: center.y - half_side,
        },
        Coord {
            x: center.x + half_side,
            y: center.y + half_side,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::polygon;

    #[test]
    fn box_is_square_and_contains_margin() {
        // 20 m x 10 m footprint.
        let poly = polygon![
            (x: 100.0, y: 200.0),
            (x: 120.0, y: 200.0),
            (x: 120.0, y: 210.0),
            (x: 100.0, y: 210.0),
        ];

        let rect = squared_box_around(&poly, 5.0).unwrap();
        assert_relative_eq!(rect.width(), rect.height());
        // Widest dimension is 20 m + 2 * 5 m margin.
        assert_relative_eq!(rect.width(), 30.0);
        // Centered on the footprint.
        assert_relative_eq!(rect.center().x, 110.0);
        assert_relative_eq!(rect.center().y, 205.0);
        // The margin is respected on the long axis.
        assert_relative_eq!(rect.min().x, 95.0);
        assert_relative_eq!(rect.max().x, 125.0);
    }

    #[test]
    fn zero_margin_squares_the_envelope() {
        let poly = polygon![
            (x: 0.0, y: 0.0),
            (x: 4.0, y: 0.0),
            (x: 4.0, y: 2.0),
            (x: 0.0, y: 2.0),
        ];
        let rect = squared_box_around(&poly, 0.0).unwrap();
        assert_relative_eq!(rect.width(), 4.0);
        assert_relative_eq!(rect.height(), 4.0);
    }
}
