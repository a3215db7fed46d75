// THEORY:
// A `Color` is the smallest unit of the tracker's vocabulary. It is used in two
// very different roles: as the long-lived *target color* held in the tracker's
// configuration, and as the ephemeral per-pixel sample read out of a captured
// frame. Both roles share one representation so that comparing them is trivial.
//
// Channel order is fixed to red-green-blue everywhere inside this crate. Capture
// backends that deliver BGR(X) data convert at the capture boundary, which keeps
// the distance metric below honest: L1 distance does not care about channel
// order, but it does care that both operands use the *same* order.

use crate::error::ConfigError;
use std::fmt;

/// The largest possible L1 distance between two colors (3 channels * 255).
pub const MAX_DISTANCE: u32 = 765;

/// An 8-bit-per-channel RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Sum of absolute per-channel differences. Always in `0..=MAX_DISTANCE`.
    #[inline]
    pub fn l1_distance(&self, other: &Color) -> u32 {
        self.r.abs_diff(other.r) as u32
            + self.g.abs_diff(other.g) as u32
            + self.b.abs_diff(other.b) as u32
    }

    /// Parses `#RRGGBB` or `RRGGBB` (case-insensitive).
    pub fn from_hex(text: &str) -> Result<Self, ConfigError> {
        let digits = text.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(ConfigError::InvalidColor(text.to_string()));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16)
                .map_err(|_| ConfigError::InvalidColor(text.to_string()))
        };
        Ok(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }
}

impl From<image::Rgb<u8>> for Color {
    fn from(pixel: image::Rgb<u8>) -> Self {
        let [r, g, b] = pixel.0;
        Self { r, g, b }
    }
}

impl From<Color> for image::Rgb<u8> {
    fn from(color: Color) -> Self {
        image::Rgb([color.r, color.g, color.b])
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_symmetric_and_bounded() {
        let black = Color::new(0, 0, 0);
        let white = Color::new(255, 255, 255);
        assert_eq!(black.l1_distance(&white), MAX_DISTANCE);
        assert_eq!(white.l1_distance(&black), MAX_DISTANCE);
        assert_eq!(white.l1_distance(&white), 0);
    }

    #[test]
    fn distance_sums_channels() {
        let a = Color::new(10, 20, 30);
        let b = Color::new(15, 10, 30);
        assert_eq!(a.l1_distance(&b), 15);
    }

    #[test]
    fn parses_hex_with_and_without_hash() {
        assert_eq!(Color::from_hex("#8D00C9").unwrap(), Color::new(141, 0, 201));
        assert_eq!(Color::from_hex("8d00c9").unwrap(), Color::new(141, 0, 201));
        assert_eq!(Color::new(141, 0, 201).to_string(), "#8D00C9");
    }

    #[test]
    fn rejects_malformed_hex() {
        assert!(Color::from_hex("#12345").is_err());
        assert!(Color::from_hex("#GG0000").is_err());
        assert!(Color::from_hex("").is_err());
    }
}
