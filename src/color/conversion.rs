//! Color value type and color space conversion utilities
//!
//! Provides:
//! - `Color`, an 8-bit sRGB triple with hex formatting and parsing
//! - sRGB to CIE Lab (D65) and back, with gamut clamping
//! - ΔE76 (Lab Euclidean distance), the pinned perceptual metric

use std::fmt;
use std::str::FromStr;

use palette::{FromColor, Hsv, Lab, Srgb};
use serde::{Deserialize, Serialize};

use crate::{PaletteError, Result};

/// An sRGB color with 8 bits per channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Channels as an array, in RGB order
    pub fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// Convert to CIE Lab under D65
    pub fn to_lab(self) -> Lab {
        let srgb = Srgb::new(self.r, self.g, self.b).into_format::<f32>();
        Lab::from_color(srgb)
    }

    /// Convert a Lab color back to 8-bit sRGB, clamping out-of-gamut values
    pub fn from_lab(lab: Lab) -> Self {
        let srgb: Srgb = Srgb::from_color(lab);
        let clamped = Srgb::new(
            srgb.red.clamp(0.0, 1.0),
            srgb.green.clamp(0.0, 1.0),
            srgb.blue.clamp(0.0, 1.0),
        );
        let rgb: Srgb<u8> = clamped.into_format();
        Self::new(rgb.red, rgb.green, rgb.blue)
    }

    /// Convert to HSV (hue in degrees, saturation and value in 0..=1)
    pub fn to_hsv(self) -> Hsv {
        Hsv::from_color(Srgb::new(self.r, self.g, self.b).into_format::<f32>())
    }

    /// Convert an HSV color back to 8-bit sRGB
    pub fn from_hsv(hsv: Hsv) -> Self {
        let srgb: Srgb = Srgb::from_color(hsv);
        let clamped = Srgb::new(
            srgb.red.clamp(0.0, 1.0),
            srgb.green.clamp(0.0, 1.0),
            srgb.blue.clamp(0.0, 1.0),
        );
        let rgb: Srgb<u8> = clamped.into_format();
        Self::new(rgb.red, rgb.green, rgb.blue)
    }

    /// Uppercase hexadecimal representation (e.g. "#FF0000")
    pub fn hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Parse a hexadecimal color string ("#FF0000" or "FF0000")
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.trim_start_matches('#');
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(PaletteError::invalid_parameter("hex", hex));
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16)
                .map_err(|_| PaletteError::invalid_parameter("hex", hex))
        };

        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    /// Mean of the three channels, used for brightness filtering
    pub fn brightness(self) -> f32 {
        (self.r as f32 + self.g as f32 + self.b as f32) / 3.0
    }

    /// Channels normalized to 0..=1
    pub fn normalized(self) -> [f32; 3] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        ]
    }
}

impl From<[u8; 3]> for Color {
    fn from(rgb: [u8; 3]) -> Self {
        Self::new(rgb[0], rgb[1], rgb[2])
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex())
    }
}

impl FromStr for Color {
    type Err = PaletteError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

/// Squared ΔE76 between two Lab colors
pub fn delta_e_squared(lab1: Lab, lab2: Lab) -> f32 {
    let dl = lab1.l - lab2.l;
    let da = lab1.a - lab2.a;
    let db = lab1.b - lab2.b;
    dl * dl + da * da + db * db
}

/// Compute Delta E (color difference) between two Lab colors
///
/// Uses Euclidean distance in Lab (ΔE76). This is the pinned metric for
/// pencil matching and clustering; do not swap it per call site.
pub fn delta_e(lab1: Lab, lab2: Lab) -> f32 {
    delta_e_squared(lab1, lab2).sqrt()
}
