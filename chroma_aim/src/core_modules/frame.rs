// THEORY:
// `Frame` and `Mask` are the two "dumb" data containers that flow through a
// single tick. A `Frame` is produced by a capture backend, owned by the tick
// that captured it, and dropped when the tick ends. A `Mask` is derived from a
// frame by the color-mask stage and has exactly the same dimensions.
//
// Neither type knows anything about tracking; they only offer indexed access.

use crate::core_modules::color::Color;
use crate::error::CaptureError;
use image::RgbImage;

/// An immutable, captured RGB image.
#[derive(Debug, Clone)]
pub struct Frame {
    image: RgbImage,
}

impl Frame {
    pub fn from_image(image: RgbImage) -> Self {
        Self { image }
    }

    /// Builds a frame from a tightly packed RGB buffer.
    pub fn from_rgb(width: u32, height: u32, data: Vec<u8>) -> Result<Self, CaptureError> {
        let expected = width as usize * height as usize * 3;
        let actual = data.len();
        RgbImage::from_raw(width, height, data)
            .map(Self::from_image)
            .ok_or(CaptureError::DimensionMismatch { expected, actual })
    }

    /// Builds a frame where every pixel has the same color.
    pub fn filled(width: u32, height: u32, color: Color) -> Self {
        Self::from_image(RgbImage::from_pixel(width, height, color.into()))
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Returns the pixel at (x, y), or `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        self.image.get_pixel_checked(x, y).map(|p| Color::from(*p))
    }

    /// Iterates pixels in row-major scan order.
    pub fn pixels(&self) -> impl Iterator<Item = Color> + '_ {
        self.image.pixels().map(|p| Color::from(*p))
    }
}

/// A boolean grid; `true` marks a pixel that matched the target color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    pub width: usize,
    pub height: usize,
    /// Row-major, length = width * height.
    pub bits: Vec<bool>,
}

impl Mask {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            bits: vec![false; width * height],
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.bits[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: bool) {
        if x < self.width && y < self.height {
            self.bits[y * self.width + x] = value;
        }
    }

    pub fn count(&self) -> usize {
        self.bits.iter().filter(|b| **b).count()
    }

    pub fn is_empty(&self) -> bool {
        !self.bits.iter().any(|b| *b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rgb_checks_buffer_length() {
        let err = Frame::from_rgb(2, 2, vec![0u8; 11]).unwrap_err();
        assert!(matches!(
            err,
            CaptureError::DimensionMismatch { expected: 12, actual: 11 }
        ));
        assert!(Frame::from_rgb(2, 2, vec![0u8; 12]).is_ok());
    }

    #[test]
    fn pixel_is_bounds_checked() {
        let frame = Frame::filled(3, 2, Color::new(1, 2, 3));
        assert_eq!(frame.pixel(2, 1), Some(Color::new(1, 2, 3)));
        assert_eq!(frame.pixel(3, 0), None);
        assert_eq!(frame.pixel(0, 2), None);
    }

    #[test]
    fn mask_ignores_out_of_range_access() {
        let mut mask = Mask::new(2, 2);
        mask.set(5, 5, true);
        assert!(mask.is_empty());
        mask.set(1, 0, true);
        assert!(mask.get(1, 0));
        assert!(!mask.get(9, 0));
        assert_eq!(mask.count(), 1);
    }
}
