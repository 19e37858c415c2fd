//! The restoration pipeline: sequences every stage over one image.

use std::path::Path;
use std::time::Instant;

use crate::codec::{self, OutputFormat};
use crate::correction::{
    balance_colors, clip_histogram, correct_chroma, equalize_lightness, invert, load_inverted,
    normalize_range,
};
use crate::error::EngineError;
use crate::image::PixelBuffer;
use crate::transform::params::CorrectionParams;

/// The core function.
///
/// Applies the correction chain to an already inverted buffer:
/// 1. Histogram equalization + percentile clip
/// 2. Range normalization
/// 3. Lightness equalization (only when configured)
/// 4. Color balance
/// 5. Red/yellow chroma attenuation
///
/// `params` must already be validated ([`CorrectionParams::validate`]);
/// out-of-range values are not rejected here.
pub fn correct(inverted: &PixelBuffer, params: &CorrectionParams) -> PixelBuffer {
    let start = Instant::now();

    let (clipped, report) = clip_histogram(inverted, &params.clip);
    tracing::debug!(
        windows = ?report.windows,
        clipped = report.total_clipped(),
        "histogram clip done"
    );

    let mut current = normalize_range(&clipped, params.normalize_ceiling);
    drop(clipped);

    if let Some(eq) = &params.lightness_equalization {
        current = equalize_lightness(&current, eq);
        tracing::debug!(?eq, "lightness equalization done");
    }

    let balanced = balance_colors(&current, params.gains);
    drop(current);
    let corrected = correct_chroma(&balanced, &params.chroma);

    tracing::debug!(
        width = corrected.width(),
        height = corrected.height(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "correction chain done"
    );
    corrected
}

/// Invert a decoded buffer and run the full correction chain over it.
///
/// Like [`correct`], expects validated `params`.
pub fn run(decoded: &PixelBuffer, params: &CorrectionParams) -> PixelBuffer {
    correct(&invert(decoded), params)
}

/// Decode, correct, and encode one image.
///
/// `params` is validated first and rejected with
/// [`EngineError::InvalidParams`]. Past that, only decoding and encoding can
/// fail; every stage in between is total.
pub fn process(
    input: &[u8],
    params: &CorrectionParams,
    format: OutputFormat,
) -> Result<Vec<u8>, EngineError> {
    params.validate()?;
    let inverted = load_inverted(input)?;
    let corrected = correct(&inverted, params);
    drop(inverted);
    codec::encode(&corrected, format)
}

/// Read `input`, process it, and write the result to `output`.
///
/// The output encoding follows the output path's extension: `.png` is
/// written as PNG, anything else as JPEG.
pub fn process_file(
    input: &Path,
    output: &Path,
    params: &CorrectionParams,
) -> Result<(), EngineError> {
    let bytes = std::fs::read(input).map_err(|source| EngineError::Io {
        path: input.to_path_buf(),
        source,
    })?;
    let encoded = process(&bytes, params, OutputFormat::for_path(output))?;
    std::fs::write(output, &encoded).map_err(|source| EngineError::Io {
        path: output.to_path_buf(),
        source,
    })?;
    tracing::info!(
        input = %input.display(),
        output = %output.display(),
        bytes = encoded.len(),
        "processed image"
    );
    Ok(())
}
