//! CIE L\*a\*b\* (D65) in the common 8-bit encoding.
//!
//! Lightness is scaled from `[0, 100]` to `[0, 255]` and both chroma axes
//! are offset so that neutral sits at 128:
//!
//! ```text
//! L = L* × 255 / 100
//! a = a* + 128        (red–green axis, > 128 is red)
//! b = b* + 128        (yellow–blue axis, > 128 is yellow)
//! ```
//!
//! Values are carried as `f32` so that a correction can stay fractional
//! between the forward and inverse conversion.

use palette::{IntoColor, Lab, Srgb};

/// Encoded value of a neutral (zero) chroma axis.
pub const NEUTRAL_CHROMA: f32 = 128.0;

const L_SCALE: f32 = 255.0 / 100.0;

/// A pixel in 8-bit-encoded Lab.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lab8 {
    /// Lightness, `[0, 255]`.
    pub l: f32,
    /// Red–green axis, neutral at 128.
    pub a: f32,
    /// Yellow–blue axis, neutral at 128.
    pub b: f32,
}

impl Lab8 {
    /// Convert an sRGB pixel and quantize to the 8-bit encoding.
    pub fn from_rgb(rgb: [u8; 3]) -> Self {
        let srgb = Srgb::new(rgb[0], rgb[1], rgb[2]).into_format::<f32>();
        let lab: Lab = srgb.into_color();
        Self {
            l: quantize(lab.l * L_SCALE),
            a: quantize(lab.a + NEUTRAL_CHROMA),
            b: quantize(lab.b + NEUTRAL_CHROMA),
        }
    }

    /// Convert back to sRGB, clamping out-of-gamut results.
    pub fn to_rgb(self) -> [u8; 3] {
        let lab = Lab::new(
            self.l / L_SCALE,
            self.a - NEUTRAL_CHROMA,
            self.b - NEUTRAL_CHROMA,
        );
        let srgb: Srgb = lab.into_color();
        [to_u8(srgb.red), to_u8(srgb.green), to_u8(srgb.blue)]
    }

    /// Clamp every component into `[0, 255]`.
    pub fn clamped(self) -> Self {
        Self {
            l: self.l.clamp(0.0, 255.0),
            a: self.a.clamp(0.0, 255.0),
            b: self.b.clamp(0.0, 255.0),
        }
    }
}

fn quantize(v: f32) -> f32 {
    v.round().clamp(0.0, 255.0)
}

fn to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}
