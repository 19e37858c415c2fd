//! Loader/inverter: the first stage of the pipeline.

use crate::codec;
use crate::error::EngineError;
use crate::image::PixelBuffer;

/// Invert every sample: `v ↦ 255 − v`.
pub fn invert(buffer: &PixelBuffer) -> PixelBuffer {
    buffer.map_pixels(|[r, g, b]| [255 - r, 255 - g, 255 - b])
}

/// Decode encoded image bytes and invert the result.
pub fn load_inverted(bytes: &[u8]) -> Result<PixelBuffer, EngineError> {
    let decoded = codec::decode(bytes)?;
    Ok(invert(&decoded))
}
