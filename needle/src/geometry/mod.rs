//! Needle geometry: tip/base localisation and the glyphs drawn around the tip.
//!
//! Coordinates follow image conventions: `x` grows rightward, `y` grows
//! downward, origin at the top-left pixel. The gauge pivot is not detected;
//! callers pass the image center as the reference point.

pub mod glyph;
pub mod gradient;

pub use glyph::{arrow_triangle, draw_arrow, draw_tip_marker, tip_marker_triangle};
pub use gradient::{apply_gradient, gradient_ratio};

use serde::{Deserialize, Serialize};

use crate::mask::NeedleMask;

/// Integer pixel coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance, exact in integer arithmetic.
    pub fn distance_squared(&self, other: &Point) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        dx * dx + dy * dy
    }

    pub fn distance(&self, other: &Point) -> f64 {
        (self.distance_squared(other) as f64).sqrt()
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

/// Tip and base of one needle instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeedleGeometry {
    /// Needle pixel farthest from the gauge center (the pointing end).
    pub tip: Point,
    /// Needle pixel nearest the gauge center (the pivot end).
    pub base: Point,
}

impl NeedleGeometry {
    pub fn length(&self) -> f64 {
        self.tip.distance(&self.base)
    }
}

/// Locate the needle tip and base relative to `center`.
///
/// The tip is the needle pixel with the greatest distance to `center`, the
/// base the one with the smallest. Returns `None` when the mask holds no
/// needle pixel.
///
/// Ties keep the first pixel met in row-major scan order. That order is an
/// artifact of the traversal, not a geometric property, and callers should
/// not depend on which of several equidistant pixels is chosen.
pub fn detect_needle_tip(mask: &NeedleMask, center: Point) -> Option<NeedleGeometry> {
    let mut farthest: Option<(i64, Point)> = None;
    let mut nearest: Option<(i64, Point)> = None;

    for (row, col) in mask.needle_pixels() {
        let point = Point::new(col as i32, row as i32);
        let dist = point.distance_squared(&center);

        if farthest.map_or(true, |(best, _)| dist > best) {
            farthest = Some((dist, point));
        }
        if nearest.map_or(true, |(best, _)| dist < best) {
            nearest = Some((dist, point));
        }
    }

    match (farthest, nearest) {
        (Some((_, tip)), Some((_, base))) => Some(NeedleGeometry { tip, base }),
        _ => None,
    }
}

/// Unit vector from `from` toward `to`, or `None` when the points coincide.
pub(crate) fn unit_direction(from: Point, to: Point) -> Option<(f64, f64)> {
    let dx = (to.x - from.x) as f64;
    let dy = (to.y - from.y) as f64;
    let length = (dx * dx + dy * dy).sqrt();
    if length > 0.0 {
        Some((dx / length, dy / length))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_size::ImageSize;
    use ndarray::Array2;

    fn mask_from_points(size: ImageSize, points: &[(usize, usize)]) -> NeedleMask {
        let mut values = size.empty_mask_array();
        for &(x, y) in points {
            values[[y, x]] = 1.0;
        }
        NeedleMask::new(values)
    }

    #[test]
    fn test_diagonal_needle() {
        let size = ImageSize::from_width_height(100, 100);
        let points: Vec<_> = (40..50).map(|i| (i, i)).collect();
        let mask = mask_from_points(size, &points);

        let geometry = detect_needle_tip(&mask, Point::new(50, 50)).unwrap();
        assert_eq!(geometry.tip, Point::new(40, 40));
        assert_eq!(geometry.base, Point::new(49, 49));
    }

    #[test]
    fn test_empty_mask_is_absent() {
        let mask = NeedleMask::zeros(ImageSize::from_width_height(32, 32));
        assert!(detect_needle_tip(&mask, Point::new(16, 16)).is_none());
    }

    #[test]
    fn test_probabilities_at_threshold_are_ignored() {
        let mut values = Array2::from_elem((10, 10), 0.5f32);
        values[[2, 3]] = 0.9;
        let mask = NeedleMask::new(values);

        let geometry = detect_needle_tip(&mask, Point::new(5, 5)).unwrap();
        assert_eq!(geometry.tip, Point::new(3, 2));
        assert_eq!(geometry.base, Point::new(3, 2));
    }

    #[test]
    fn test_tip_and_base_are_mask_members() {
        let size = ImageSize::from_width_height(64, 48);
        let points = [(3, 40), (31, 25), (60, 2), (33, 22), (10, 10)];
        let mask = mask_from_points(size, &points);
        let center = Point::new(32, 24);

        let geometry = detect_needle_tip(&mask, center).unwrap();
        for p in [geometry.tip, geometry.base] {
            assert!(mask.is_needle(p.y as usize, p.x as usize));
        }
        assert!(geometry.tip.distance(&center) >= geometry.base.distance(&center));
        assert_eq!(geometry.base, Point::new(31, 25));
        assert_eq!(geometry.tip, Point::new(60, 2));
    }

    #[test]
    fn test_equidistant_ties_take_first_in_scan_order() {
        let size = ImageSize::from_width_height(11, 11);
        // Four pixels on a ring of radius 3 around (5, 5).
        let mask = mask_from_points(size, &[(5, 2), (2, 5), (8, 5), (5, 8)]);

        let geometry = detect_needle_tip(&mask, Point::new(5, 5)).unwrap();
        assert_eq!(geometry.tip, Point::new(5, 2));
        assert_eq!(geometry.base, Point::new(5, 2));
        assert_eq!(geometry.length(), 0.0);
    }

    #[test]
    fn test_unit_direction() {
        let (dx, dy) = unit_direction(Point::new(0, 0), Point::new(3, 4)).unwrap();
        assert!((dx - 0.6).abs() < 1e-12);
        assert!((dy - 0.8).abs() < 1e-12);
        assert!(unit_direction(Point::new(7, 7), Point::new(7, 7)).is_none());
    }
}
