//! Base-to-tip colour ramp painted over the needle pixels.
//!
//! Alternate rendering mode. The default annotation flow highlights the needle
//! with a translucent overlay instead; see [`crate::annotator::RenderMode`].

use image::{Rgb, RgbImage};

use super::Point;
use crate::error::Result;
use crate::image_size::ImageSize;
use crate::mask::NeedleMask;

/// Position of `pixel` along the needle as a fraction of the base-to-tip length.
///
/// Measured as straight-line distance from `base`, clamped to at most 1.0.
/// A zero-length needle maps every pixel to 0.0.
pub fn gradient_ratio(pixel: Point, base: Point, tip: Point) -> f64 {
    let total_length = tip.distance(&base);
    if total_length > 0.0 {
        (pixel.distance(&base) / total_length).min(1.0)
    } else {
        0.0
    }
}

fn lerp_channel(dark: u8, bright: u8, ratio: f64) -> u8 {
    (dark as f64 + (bright as f64 - dark as f64) * ratio) as u8
}

/// Ramp colour for `ratio`, per channel, truncated toward zero.
pub fn gradient_color(dark: Rgb<u8>, bright: Rgb<u8>, ratio: f64) -> Rgb<u8> {
    Rgb([
        lerp_channel(dark[0], bright[0], ratio),
        lerp_channel(dark[1], bright[1], ratio),
        lerp_channel(dark[2], bright[2], ratio),
    ])
}

/// Replace every needle pixel with a colour ramping from `dark` at the base
/// to `bright` at the tip.
///
/// Needle pixels are overwritten, not blended. Pixels outside the mask are
/// copied unchanged. The mask must have the image's dimensions.
pub fn apply_gradient(
    image: &RgbImage,
    mask: &NeedleMask,
    base: Point,
    tip: Point,
    dark: Rgb<u8>,
    bright: Rgb<u8>,
) -> Result<RgbImage> {
    mask.ensure_size(ImageSize::of_image(image))?;

    let mut result = image.clone();
    for (row, col) in mask.needle_pixels() {
        let pixel = Point::new(col as i32, row as i32);
        let ratio = gradient_ratio(pixel, base, tip);
        result.put_pixel(col as u32, row as u32, gradient_color(dark, bright, ratio));
    }
    Ok(result)
}
