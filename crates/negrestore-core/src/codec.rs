//! Decoding input bytes into a [`PixelBuffer`] and encoding results back.

use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::image::PixelBuffer;

/// Quality used for JPEG output when none is configured.
pub const DEFAULT_JPEG_QUALITY: u8 = 75;

/// Encoding used for the pipeline's final buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "lowercase")]
pub enum OutputFormat {
    /// Lossy JPEG at the given quality (1–100).
    Jpeg { quality: u8 },
    /// Lossless PNG.
    Png,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Jpeg {
            quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl OutputFormat {
    /// Pick an encoding from a file extension. `.png` keeps PNG; anything
    /// else is written as JPEG.
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("png") => Self::Png,
            _ => Self::default(),
        }
    }

    /// Conventional file extension, without the dot.
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg { .. } => "jpg",
            Self::Png => "png",
        }
    }
}

/// Decode any supported still raster (JPEG, PNG, WebP, …) to 8-bit RGB.
///
/// Alpha is dropped, grayscale is expanded, and deeper samples are reduced
/// to 8 bits. Truncated or unrecognized input fails with
/// [`EngineError::Decode`].
pub fn decode(bytes: &[u8]) -> Result<PixelBuffer, EngineError> {
    let img = image::load_from_memory(bytes).map_err(EngineError::Decode)?;
    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();
    tracing::debug!(width, height, color = ?img.color(), "decoded input image");
    Ok(PixelBuffer::from_raw(width, height, rgb.as_raw()))
}

/// Encode a buffer with the requested output format.
pub fn encode(buffer: &PixelBuffer, format: OutputFormat) -> Result<Vec<u8>, EngineError> {
    let mut out = Vec::new();
    let (width, height) = (buffer.width(), buffer.height());
    let written = match format {
        OutputFormat::Jpeg { quality } => {
            JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100)).write_image(
                buffer.as_bytes(),
                width,
                height,
                ExtendedColorType::Rgb8,
            )
        }
        OutputFormat::Png => PngEncoder::new(&mut out).write_image(
            buffer.as_bytes(),
            width,
            height,
            ExtendedColorType::Rgb8,
        ),
    };
    written.map_err(EngineError::Encode)?;
    Ok(out)
}
