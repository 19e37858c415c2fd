//! Red and yellow cast attenuation in Lab.
//!
//! Inverted negatives tend to carry a warm cast. Working on the chroma axes
//! of Lab leaves lightness alone, so the correction does not band the way a
//! per-channel RGB gain would.
//!
//! ```text
//! a > 128        → a = 128 + (a − 128) × red_intensity
//! b > threshold  → b = threshold + (b − threshold) × yellow_intensity
//! ```
//!
//! Values at or below their pivot are untouched. Both axes are clamped to
//! `[0, 255]` before converting back to RGB.

use crate::color::{Lab8, NEUTRAL_CHROMA};
use crate::image::PixelBuffer;
use crate::transform::params::ChromaParams;

/// Attenuate red and yellow excess for every pixel.
pub fn correct_chroma(buffer: &PixelBuffer, params: &ChromaParams) -> PixelBuffer {
    buffer.map_pixels(|rgb| correct_pixel(Lab8::from_rgb(rgb), params).to_rgb())
}

/// Apply the red/yellow rules to one encoded Lab pixel.
pub fn correct_pixel(lab: Lab8, params: &ChromaParams) -> Lab8 {
    Lab8 {
        l: lab.l,
        a: attenuate(lab.a, NEUTRAL_CHROMA, params.red_intensity),
        b: attenuate(lab.b, params.yellow_threshold, params.yellow_intensity),
    }
    .clamped()
}

/// Scale the part of `value` that lies above `pivot`.
pub fn attenuate(value: f32, pivot: f32, intensity: f32) -> f32 {
    if value > pivot {
        pivot + (value - pivot) * intensity
    } else {
        value
    }
}
