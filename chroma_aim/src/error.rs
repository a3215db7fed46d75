// THEORY:
// Error types for the tracker. Capture and input errors are recoverable at the
// tick boundary: they end the tick and become a status message. Configuration
// errors go back to whoever called the setter, and the old value stays.

use std::time::Duration;
use thiserror::Error;

/// A frame could not be captured.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CaptureError {
    #[error("capture timed out after {0:?}")]
    Timeout(Duration),

    #[error("capture backend failed: {0}")]
    Backend(String),

    #[error("unsupported pixel format: depth {depth}, {bits_per_pixel} bits per pixel")]
    UnsupportedFormat { depth: u8, bits_per_pixel: u8 },

    #[error("frame buffer holds {actual} bytes, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// A pointer command could not be issued.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputError {
    #[error("pointer backend failed: {0}")]
    Backend(String),
}

/// A configuration value was rejected; the previous value is kept.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{field} = {value} is outside [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },

    #[error("invalid color '{0}', expected #RRGGBB")]
    InvalidColor(String),

    #[error("pixel ({x}, {y}) is outside the {width}x{height} frame")]
    OutOfFrame { x: u32, y: u32, width: u32, height: u32 },

    #[error("invalid {name}: {reason}")]
    InvalidVar { name: &'static str, reason: String },
}

/// Anything that can go wrong inside one tick.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TickError {
    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Input(#[from] InputError),
}
