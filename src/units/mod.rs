//! # Unit Conversion
//!
//! Pure conversions between print-physical millimeters, the pixel grid a
//! design is authored in, DPI-specific device pixels and PDF points.
//!
//! ## Rounding
//!
//! Only [`mm_to_surface_pixels`] rounds, because a surface has a whole number
//! of pixels. Element geometry stays fractional all the way down to the
//! drawing primitive, so many small elements never accumulate rounding error.
//!
//! ```text
//! dots_per_mm = dpi / 25.4
//!
//!   203 DPI ≈  7.99 dots/mm   (50.8mm → 406 dots)
//!   300 DPI ≈ 11.81 dots/mm   (50.8mm → 600 dots)
//! ```
//!
//! ## Example
//!
//! ```
//! use labelpress::units::{self, Dpi};
//!
//! assert_eq!(units::mm_to_surface_pixels(50.8, Dpi::Dpi300), 600);
//! let px = units::pixels_at_dpi_to_pixels_at_dpi(203.0, Dpi::Dpi203, Dpi::Dpi300);
//! assert!((px - 300.0).abs() < 1e-3);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Millimeters per inch.
pub const MM_PER_INCH: f32 = 25.4;

/// PDF user-space units per inch.
pub const POINTS_PER_INCH: f32 = 72.0;

/// Unit conversion errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitError {
    #[error("Unsupported DPI {0} (expected 203 or 300)")]
    UnsupportedDpi(u32),
}

/// A supported print resolution.
///
/// Thermal label printers come in 203 and 300 DPI heads; nothing else is
/// accepted. Serializes as the bare number.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Dpi {
    #[default]
    Dpi203,
    Dpi300,
}

impl Dpi {
    /// Both supported resolutions, lowest first.
    pub const ALL: [Dpi; 2] = [Dpi::Dpi203, Dpi::Dpi300];

    /// Numeric dots per inch.
    #[inline]
    pub fn value(self) -> u32 {
        match self {
            Dpi::Dpi203 => 203,
            Dpi::Dpi300 => 300,
        }
    }

    /// Dots per millimeter.
    #[inline]
    pub fn dots_per_mm(self) -> f32 {
        self.value() as f32 / MM_PER_INCH
    }
}

impl TryFrom<u32> for Dpi {
    type Error = UnitError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            203 => Ok(Dpi::Dpi203),
            300 => Ok(Dpi::Dpi300),
            other => Err(UnitError::UnsupportedDpi(other)),
        }
    }
}

impl From<Dpi> for u32 {
    fn from(dpi: Dpi) -> Self {
        dpi.value()
    }
}

impl fmt::Display for Dpi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// Convert millimeters to (fractional) pixels at `dpi`.
#[inline]
pub fn mm_to_pixels(value_mm: f32, dpi: Dpi) -> f32 {
    value_mm * dpi.dots_per_mm()
}

/// Convert millimeters to a whole surface dimension, rounding to nearest.
#[inline]
pub fn mm_to_surface_pixels(value_mm: f32, dpi: Dpi) -> u32 {
    mm_to_pixels(value_mm, dpi).round().max(0.0) as u32
}

/// Convert pixels at `dpi` back to millimeters.
#[inline]
pub fn pixels_to_mm(px: f32, dpi: Dpi) -> f32 {
    px / dpi.dots_per_mm()
}

/// Rescale a pixel length from one DPI grid to another. Not rounded.
#[inline]
pub fn pixels_at_dpi_to_pixels_at_dpi(px: f32, from: Dpi, to: Dpi) -> f32 {
    if from == to {
        return px;
    }
    px * to.value() as f32 / from.value() as f32
}

/// Convert millimeters to PDF points (1/72 inch).
#[inline]
pub fn mm_to_points(value_mm: f32) -> f32 {
    value_mm / MM_PER_INCH * POINTS_PER_INCH
}

/// The pixel grid a design's element geometry is authored in.
///
/// Editors lay elements out on the label's pixel grid at one DPI; exporting
/// at the other DPI scales every coordinate by the ratio of the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorSpace {
    pub dpi: Dpi,
}

impl EditorSpace {
    pub fn new(dpi: Dpi) -> Self {
        Self { dpi }
    }

    /// Multiplier taking editor pixels to pixels at `target`.
    #[inline]
    pub fn scale_to(self, target: Dpi) -> f32 {
        pixels_at_dpi_to_pixels_at_dpi(1.0, self.dpi, target)
    }

    /// Convert an editor-space length to `target` pixels.
    #[inline]
    pub fn to_target(self, px: f32, target: Dpi) -> f32 {
        pixels_at_dpi_to_pixels_at_dpi(px, self.dpi, target)
    }

    /// Convert an editor-space length to millimeters.
    #[inline]
    pub fn to_mm(self, px: f32) -> f32 {
        pixels_to_mm(px, self.dpi)
    }
}
