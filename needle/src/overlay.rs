//! Translucent highlight of a masked region.

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};

use crate::error::{NeedleError, Result};
use crate::image_size::ImageSize;
use crate::mask::NeedleMask;

fn blend_channel(source: u8, filled: u8, alpha: f64) -> u8 {
    (source as f64 * (1.0 - alpha) + filled as f64 * alpha)
        .round()
        .clamp(0.0, 255.0) as u8
}

/// Copy of `image` with every needle pixel replaced by `color`.
fn fill_masked(image: &RgbImage, mask: &NeedleMask, color: Rgb<u8>) -> RgbImage {
    let mut filled = image.clone();
    for (row, col) in mask.needle_pixels() {
        filled.put_pixel(col as u32, row as u32, color);
    }
    filled
}

/// Blend a flat `color` into the needle region of `image`.
///
/// Builds a copy with the masked pixels set to `color`, optionally resizes
/// both the source and that copy to `resize`, then mixes them as
/// `source * (1 - alpha) + filled * alpha`, rounded per channel. Outside the
/// mask the two agree, so those pixels come through unchanged.
///
/// `alpha` must lie in `[0, 1]` and the mask must match the image size.
pub fn overlay(
    image: &RgbImage,
    mask: &NeedleMask,
    color: Rgb<u8>,
    alpha: f64,
    resize: Option<ImageSize>,
) -> Result<RgbImage> {
    if !(0.0..=1.0).contains(&alpha) {
        return Err(NeedleError::InvalidAlpha(alpha));
    }
    mask.ensure_size(ImageSize::of_image(image))?;

    let filled = fill_masked(image, mask, color);

    let (source, filled) = match resize {
        Some(size) if size != ImageSize::of_image(image) => {
            let (width, height) = size.to_u32_pair();
            (
                imageops::resize(image, width, height, FilterType::Triangle),
                imageops::resize(&filled, width, height, FilterType::Triangle),
            )
        }
        _ => (image.clone(), filled),
    };

    let mut result = source;
    for (out, fill) in result.pixels_mut().zip(filled.pixels()) {
        for channel in 0..3 {
            out[channel] = blend_channel(out[channel], fill[channel], alpha);
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgb<u8> = Rgb([200, 0, 0]);

    fn checker_image(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 7 % 256) as u8, (y * 13 % 256) as u8, ((x + y) % 256) as u8])
        })
    }

    fn block_mask(size: ImageSize) -> NeedleMask {
        let mut values = size.empty_mask_array();
        for row in 2..6 {
            for col in 3..9 {
                values[[row, col]] = 0.9;
            }
        }
        NeedleMask::new(values)
    }

    #[test]
    fn test_alpha_zero_is_identity() {
        let image = checker_image(12, 8);
        let mask = block_mask(ImageSize::of_image(&image));
        let result = overlay(&image, &mask, RED, 0.0, None).unwrap();
        assert_eq!(result, image);
    }

    #[test]
    fn test_alpha_one_is_flat_fill_inside_mask() {
        let image = checker_image(12, 8);
        let mask = block_mask(ImageSize::of_image(&image));
        let result = overlay(&image, &mask, RED, 1.0, None).unwrap();

        for (x, y, pixel) in result.enumerate_pixels() {
            if mask.is_needle(y as usize, x as usize) {
                assert_eq!(*pixel, RED);
            } else {
                assert_eq!(pixel, image.get_pixel(x, y));
            }
        }
    }

    #[test]
    fn test_half_alpha_rounds() {
        let image = RgbImage::from_pixel(12, 8, Rgb([1, 10, 255]));
        let mask = block_mask(ImageSize::of_image(&image));
        let result = overlay(&image, &mask, RED, 0.5, None).unwrap();

        // (1 + 200) / 2 = 100.5 -> 101, 10 / 2 = 5, 255 / 2 = 127.5 -> 128
        assert_eq!(*result.get_pixel(4, 3), Rgb([101, 5, 128]));
        assert_eq!(*result.get_pixel(0, 0), Rgb([1, 10, 255]));
    }

    #[test]
    fn test_resize_changes_output_size() {
        let image = RgbImage::from_pixel(12, 8, Rgb([50, 50, 50]));
        let mask = block_mask(ImageSize::of_image(&image));
        let target = ImageSize::from_width_height(24, 16);

        let result = overlay(&image, &mask, RED, 1.0, Some(target)).unwrap();
        assert_eq!(ImageSize::of_image(&result), target);
        assert_eq!(*result.get_pixel(0, 0), Rgb([50, 50, 50]));
        assert_eq!(*result.get_pixel(12, 8), RED);
    }

    #[test]
    fn test_invalid_inputs() {
        let image = RgbImage::new(4, 4);
        let mask = NeedleMask::zeros(ImageSize::from_width_height(4, 4));
        assert!(matches!(
            overlay(&image, &mask, RED, 1.5, None),
            Err(NeedleError::InvalidAlpha(_))
        ));
        assert!(matches!(
            overlay(&image, &mask, RED, f64::NAN, None),
            Err(NeedleError::InvalidAlpha(_))
        ));

        let wrong = NeedleMask::zeros(ImageSize::from_width_height(5, 4));
        assert!(matches!(
            overlay(&image, &wrong, RED, 0.5, None),
            Err(NeedleError::DimensionMismatch { .. })
        ));
    }
}
