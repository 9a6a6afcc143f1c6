//! Image dimensions and size utilities

use image::RgbImage;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Width and height of an image or mask in pixels.
///
/// Arrays built from an `ImageSize` use the row-major `(height, width)` shape,
/// while image buffers report `(width, height)`; this type sits between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageSize {
    /// Image width in pixels
    pub width: usize,
    /// Image height in pixels
    pub height: usize,
}

impl ImageSize {
    pub fn from_width_height(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Size of an RGB image buffer.
    pub fn of_image(image: &RgbImage) -> Self {
        Self {
            width: image.width() as usize,
            height: image.height() as usize,
        }
    }

    /// Size of a row-major array, whose shape is `(height, width)`.
    pub fn of_array<T>(array: &Array2<T>) -> Self {
        let (height, width) = array.dim();
        Self { width, height }
    }

    /// Zero-filled `f32` array with shape `(height, width)`.
    pub fn empty_mask_array(&self) -> Array2<f32> {
        Array2::zeros((self.height, self.width))
    }

    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    /// Integer center `(width / 2, height / 2)`.
    pub fn center(&self) -> (i32, i32) {
        ((self.width / 2) as i32, (self.height / 2) as i32)
    }

    /// Convert to tuple (width, height)
    pub fn to_tuple(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Dimensions as the `u32` pair used by `image` buffers.
    pub fn to_u32_pair(&self) -> (u32, u32) {
        (self.width as u32, self.height as u32)
    }
}

impl From<(usize, usize)> for ImageSize {
    fn from(dimensions: (usize, usize)) -> Self {
        Self::from_width_height(dimensions.0, dimensions.1)
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_uses_integer_division() {
        assert_eq!(ImageSize::from_width_height(100, 100).center(), (50, 50));
        assert_eq!(ImageSize::from_width_height(101, 37).center(), (50, 18));
    }

    #[test]
    fn test_array_shape_is_row_major() {
        let size = ImageSize::from_width_height(7, 3);
        let array = size.empty_mask_array();
        assert_eq!(array.dim(), (3, 7));
        assert_eq!(ImageSize::of_array(&array), size);
        assert_eq!(size.pixel_count(), 21);
    }

    #[test]
    fn test_display() {
        assert_eq!(ImageSize::from((640, 480)).to_string(), "640x480");
    }
}
