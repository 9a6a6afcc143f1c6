//! Per-instance needle masks.

use image::imageops::{self, FilterType};
use image::{GrayImage, ImageBuffer, Luma};
use ndarray::Array2;

use crate::error::{NeedleError, Result};
use crate::image_size::ImageSize;

/// Values strictly above this are needle pixels.
pub const MASK_THRESHOLD: f32 = 0.5;

/// Probability mask for a single detected needle instance.
///
/// Indexed `[row, col]`. Segmentation models emit masks at their own input
/// resolution, so callers resize with [`NeedleMask::resized`] before pairing a
/// mask with the source image.
#[derive(Debug, Clone, PartialEq)]
pub struct NeedleMask {
    values: Array2<f32>,
}

impl NeedleMask {
    pub fn new(values: Array2<f32>) -> Self {
        Self { values }
    }

    pub fn zeros(size: ImageSize) -> Self {
        Self::new(size.empty_mask_array())
    }

    /// Build a mask from an 8-bit grayscale image, mapping 0..=255 onto 0.0..=1.0.
    pub fn from_gray_image(image: &GrayImage) -> Self {
        let (width, height) = image.dimensions();
        let values = Array2::from_shape_fn((height as usize, width as usize), |(row, col)| {
            image.get_pixel(col as u32, row as u32)[0] as f32 / 255.0
        });
        Self::new(values)
    }

    pub fn values(&self) -> &Array2<f32> {
        &self.values
    }

    pub fn size(&self) -> ImageSize {
        ImageSize::of_array(&self.values)
    }

    /// Whether `(row, col)` is a needle pixel. Out-of-range indices are not.
    pub fn is_needle(&self, row: usize, col: usize) -> bool {
        self.values
            .get((row, col))
            .is_some_and(|&value| value > MASK_THRESHOLD)
    }

    /// Needle pixels as `(row, col)` in row-major scan order.
    pub fn needle_pixels(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.values
            .indexed_iter()
            .filter(|&(_, &value)| value > MASK_THRESHOLD)
            .map(|(index, _)| index)
    }

    pub fn needle_pixel_count(&self) -> usize {
        self.values.iter().filter(|&&v| v > MASK_THRESHOLD).count()
    }

    pub fn is_empty(&self) -> bool {
        !self.values.iter().any(|&v| v > MASK_THRESHOLD)
    }

    /// Fail unless this mask has exactly `size`.
    pub fn ensure_size(&self, size: ImageSize) -> Result<()> {
        let actual = self.size();
        if actual != size {
            return Err(NeedleError::DimensionMismatch {
                expected: size,
                actual,
            });
        }
        Ok(())
    }

    /// Bilinear resize to `size`. Returns a clone when the size already matches.
    pub fn resized(&self, size: ImageSize) -> Self {
        let current = self.size();
        if current == size {
            return self.clone();
        }

        let (width, height) = current.to_u32_pair();
        let buffer: ImageBuffer<Luma<f32>, Vec<f32>> = ImageBuffer::from_fn(width, height, |x, y| {
            Luma([self.values[[y as usize, x as usize]]])
        });

        let (target_w, target_h) = size.to_u32_pair();
        let resized = imageops::resize(&buffer, target_w, target_h, FilterType::Triangle);

        let values = Array2::from_shape_fn((size.height, size.width), |(row, col)| {
            resized.get_pixel(col as u32, row as u32)[0]
        });
        Self::new(values)
    }
}

impl From<Array2<f32>> for NeedleMask {
    fn from(values: Array2<f32>) -> Self {
        Self::new(values)
    }
}
