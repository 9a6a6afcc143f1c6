//! Triangular glyphs pointing along the needle, drawn just beyond its tip.

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_line_segment_mut, draw_polygon_mut};
use imageproc::point::Point as PolyPoint;

use super::{unit_direction, Point};

/// Distance from the needle tip to the arrow apex.
pub const ARROW_TIP_OFFSET: f64 = 20.0;
/// Arrow length from apex to the wing baseline.
pub const ARROW_LENGTH: f64 = 30.0;
/// Half of the arrow's base width.
pub const ARROW_HALF_WIDTH: f64 = 15.0;
/// Outline thickness of the arrow in pixels.
pub const ARROW_STROKE_WIDTH: i32 = 2;

pub const MARKER_TIP_OFFSET: f64 = 8.0;
pub const MARKER_SIZE: f64 = 12.0;
/// Marker half-width as a fraction of [`MARKER_SIZE`].
pub const MARKER_WIDTH_FACTOR: f64 = 0.6;

/// Triangle whose apex sits `apex_offset` pixels past `tip` on the ray from
/// `center` through `tip`, with its base `length` pixels back toward the
/// center and `half_width` pixels either side of the ray.
///
/// Vertices are truncated toward zero, apex first. `None` when `tip`
/// coincides with `center`.
fn directed_triangle(
    center: Point,
    tip: Point,
    apex_offset: f64,
    length: f64,
    half_width: f64,
) -> Option<[Point; 3]> {
    let (dx, dy) = unit_direction(center, tip)?;
    // Perpendicular: (dx, dy) rotated by 90 degrees.
    let (px, py) = (-dy, dx);

    let apex = Point::new(
        (tip.x as f64 + dx * apex_offset) as i32,
        (tip.y as f64 + dy * apex_offset) as i32,
    );
    let back_x = apex.x as f64 - dx * length;
    let back_y = apex.y as f64 - dy * length;

    let wing1 = Point::new(
        (back_x + px * half_width) as i32,
        (back_y + py * half_width) as i32,
    );
    let wing2 = Point::new(
        (back_x - px * half_width) as i32,
        (back_y - py * half_width) as i32,
    );

    Some([apex, wing1, wing2])
}

/// Vertices of the directional arrow for a needle ending at `tip`.
pub fn arrow_triangle(center: Point, tip: Point) -> Option<[Point; 3]> {
    directed_triangle(center, tip, ARROW_TIP_OFFSET, ARROW_LENGTH, ARROW_HALF_WIDTH)
}

/// Vertices of the small tip marker for a needle ending at `tip`.
pub fn tip_marker_triangle(center: Point, tip: Point) -> Option<[Point; 3]> {
    directed_triangle(
        center,
        tip,
        MARKER_TIP_OFFSET,
        MARKER_SIZE,
        MARKER_SIZE * MARKER_WIDTH_FACTOR,
    )
}

fn fill_triangle(image: &mut RgbImage, triangle: &[Point; 3], color: Rgb<u8>) {
    let mut poly: Vec<PolyPoint<i32>> = triangle.iter().map(|p| PolyPoint::new(p.x, p.y)).collect();
    // The rasteriser rejects closed paths, so collapse a repeated endpoint.
    while poly.len() > 1 && poly.first() == poly.last() {
        poly.pop();
    }
    if poly.len() == 1 {
        let p = poly[0];
        if p.x >= 0 && p.y >= 0 && (p.x as u32) < image.width() && (p.y as u32) < image.height() {
            image.put_pixel(p.x as u32, p.y as u32, color);
        }
        return;
    }
    draw_polygon_mut(image, &poly, color);
}

fn stroke_triangle(image: &mut RgbImage, triangle: &[Point; 3], color: Rgb<u8>, width: i32) {
    for i in 0..3 {
        let a = triangle[i];
        let b = triangle[(i + 1) % 3];
        for ox in 0..width {
            for oy in 0..width {
                draw_line_segment_mut(
                    image,
                    ((a.x + ox) as f32, (a.y + oy) as f32),
                    ((b.x + ox) as f32, (b.y + oy) as f32),
                    color,
                );
            }
        }
    }
}

/// Draw the directional arrow in place. No-op when `tip == center`.
pub fn draw_arrow_mut(
    image: &mut RgbImage,
    center: Point,
    tip: Point,
    fill: Rgb<u8>,
    stroke: Rgb<u8>,
) {
    if let Some(triangle) = arrow_triangle(center, tip) {
        fill_triangle(image, &triangle, fill);
        stroke_triangle(image, &triangle, stroke, ARROW_STROKE_WIDTH);
    }
}

/// Copy of `image` with a filled, outlined arrow pointing past the needle tip.
pub fn draw_arrow(
    image: &RgbImage,
    center: Point,
    tip: Point,
    fill: Rgb<u8>,
    stroke: Rgb<u8>,
) -> RgbImage {
    let mut result = image.clone();
    draw_arrow_mut(&mut result, center, tip, fill, stroke);
    result
}

/// Draw the tip marker in place. No-op when `tip == center`.
pub fn draw_tip_marker_mut(image: &mut RgbImage, center: Point, tip: Point, color: Rgb<u8>) {
    if let Some(triangle) = tip_marker_triangle(center, tip) {
        fill_triangle(image, &triangle, color);
    }
}

/// Copy of `image` with a small solid triangle marking the needle tip.
pub fn draw_tip_marker(image: &RgbImage, center: Point, tip: Point, color: Rgb<u8>) -> RgbImage {
    let mut result = image.clone();
    draw_tip_marker_mut(&mut result, center, tip, color);
    result
}
