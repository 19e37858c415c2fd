//! Global min/max range normalization.

use crate::image::PixelBuffer;

/// Linearly rescale all samples so the global minimum maps to 0 and the
/// global maximum maps to `ceiling`.
///
/// ```text
/// out = round((v − min) × ceiling / (max − min)),  clamped to [0, ceiling]
/// ```
///
/// Ties round away from zero (`122.5 → 123`), not half-to-even.
///
/// A flat buffer (`max == min`) has no range to stretch and becomes all
/// zeros.
pub fn normalize_range(buffer: &PixelBuffer, ceiling: u8) -> PixelBuffer {
    let Some((min, max)) = buffer.sample_range() else {
        return buffer.clone();
    };
    if max == min {
        tracing::debug!(value = min, "flat image, normalizing to zero");
        return buffer.map_pixels(|_| [0, 0, 0]);
    }

    let scale = ceiling as f64 / (max - min) as f64;
    let lut: [u8; 256] = std::array::from_fn(|v| {
        let v = (v as f64 - min as f64) * scale;
        v.round().clamp(0.0, ceiling as f64) as u8
    });
    buffer.map_channels(&[lut; 3])
}
