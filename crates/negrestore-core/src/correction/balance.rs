//! Per-channel multiplicative color balance.

use crate::image::PixelBuffer;

/// Multiply each channel by its gain, clamp to `[0, 255]`, and round.
///
/// `gains` is `[R, G, B]`, matching the buffer's channel order.
pub fn balance_colors(buffer: &PixelBuffer, gains: [f32; 3]) -> PixelBuffer {
    let luts: [[u8; 256]; 3] =
        std::array::from_fn(|c| std::array::from_fn(|v| scale(v as u8, gains[c])));
    buffer.map_channels(&luts)
}

fn scale(v: u8, gain: f32) -> u8 {
    (v as f32 * gain).clamp(0.0, 255.0).round() as u8
}
