//! End-to-end tests for the restoration engine.
//!
//! Run with: `cargo test -p negrestore-core`

use negrestore_core::correction::{
    balance_colors, clip_histogram, correct_chroma, equalize_lightness, invert, normalize_range,
};
use negrestore_core::transform::params::LightnessEqualization;
use negrestore_core::{CorrectionParams, EngineError, OutputFormat, PixelBuffer, decode, encode};

/// Deterministic pseudo-random image (xorshift).
fn noisy_image(width: u32, height: u32, seed: u32) -> PixelBuffer {
    let mut state = seed.max(1);
    let pixels = (0..width * height)
        .map(|_| {
            let mut px = [0u8; 3];
            for v in &mut px {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                *v = (state >> 24) as u8;
            }
            px
        })
        .collect();
    PixelBuffer::new(width, height, pixels)
}

/// A warm, low-contrast "negative": orange base with darker structure.
fn orange_negative(width: u32, height: u32) -> PixelBuffer {
    let mut pixels = Vec::with_capacity((width * height) as usize);
    for y in 0..height {
        for x in 0..width {
            let t = (x + y) as f32 / (width + height) as f32;
            pixels.push([
                (220.0 - 80.0 * t) as u8,
                (150.0 - 70.0 * t) as u8,
                (90.0 - 50.0 * t) as u8,
            ]);
        }
    }
    PixelBuffer::new(width, height, pixels)
}

fn adversarial_inputs() -> Vec<PixelBuffer> {
    vec![
        PixelBuffer::filled(5, 4, [0, 0, 0]),
        PixelBuffer::filled(5, 4, [255, 255, 255]),
        noisy_image(31, 17, 12345),
        orange_negative(20, 12),
    ]
}

#[test]
fn test_every_stage_keeps_dimensions_and_range() {
    let params = CorrectionParams::default();
    for input in adversarial_inputs() {
        let dims = (input.width(), input.height());
        let inverted = invert(&input);
        let (clipped, _) = clip_histogram(&inverted, &params.clip);
        let normalized = normalize_range(&clipped, params.normalize_ceiling);
        let balanced = balance_colors(&normalized, params.gains);
        let corrected = correct_chroma(&balanced, &params.chroma);

        for stage in [&inverted, &clipped, &normalized, &balanced, &corrected] {
            assert_eq!((stage.width(), stage.height()), dims);
            assert_eq!(stage.as_bytes().len(), stage.len() * 3);
        }
        let (_, max) = normalized.sample_range().unwrap();
        assert!(max <= params.normalize_ceiling);
    }
}

#[test]
fn test_inversion_is_an_involution() {
    for input in adversarial_inputs() {
        assert_eq!(invert(&invert(&input)), input);
    }
}

#[test]
fn test_flat_image_normalizes_to_zero() {
    let params = CorrectionParams::default();
    let inverted = invert(&PixelBuffer::filled(6, 6, [200, 200, 200]));
    let (clipped, _) = clip_histogram(&inverted, &params.clip);
    let normalized = normalize_range(&clipped, params.normalize_ceiling);
    assert!(normalized.as_bytes().iter().all(|&v| v == 0));
}

#[test]
fn test_mid_gray_end_to_end_is_solid() {
    let input = PixelBuffer::filled(4, 4, [128, 128, 128]);
    let png = encode(&input, OutputFormat::Png).unwrap();
    let params = CorrectionParams::default();
    let out = negrestore_core::process(&png, &params, OutputFormat::Png).unwrap();
    let out = decode(&out).unwrap();
    assert_eq!((out.width(), out.height()), (4, 4));
    assert!(out.is_solid());
    assert_eq!(out.pixels()[0], [0, 0, 7]);
}

#[test]
fn test_process_is_byte_identical_across_runs() {
    let png = encode(&orange_negative(32, 24), OutputFormat::Png).unwrap();
    let params = CorrectionParams::default();
    let first = negrestore_core::process(&png, &params, OutputFormat::default()).unwrap();
    for _ in 0..3 {
        let again = negrestore_core::process(&png, &params, OutputFormat::default()).unwrap();
        assert_eq!(again, first);
    }
}

#[test]
fn test_truncated_jpeg_is_decode_error() {
    let jpeg = encode(&orange_negative(16, 16), OutputFormat::default()).unwrap();
    let params = CorrectionParams::default();
    let err = negrestore_core::process(&jpeg[..10], &params, OutputFormat::default()).unwrap_err();
    assert!(matches!(err, EngineError::Decode(_)), "{err}");
}

#[test]
fn test_orange_negative_restores_to_cooler_positive() {
    let input = orange_negative(40, 30);
    let out = negrestore_core::run(&input, &CorrectionParams::default());
    let mean = |buf: &PixelBuffer, c: usize| {
        buf.pixels().iter().map(|px| px[c] as u64).sum::<u64>() as f64 / buf.len() as f64
    };
    // The orange mask inverts to a blue cast; balance and chroma correction
    // must not turn the result red.
    assert!(mean(&out, 0) <= mean(&out, 2) + 1.0);
}

#[test]
fn test_lightness_equalization_is_opt_in() {
    let input = noisy_image(24, 30, 77);
    let default = negrestore_core::run(&input, &CorrectionParams::default());

    let params = CorrectionParams {
        lightness_equalization: Some(LightnessEqualization::default()),
        ..CorrectionParams::default()
    };
    let equalized = negrestore_core::run(&input, &params);
    assert_eq!((equalized.width(), equalized.height()), (24, 30));
    assert_eq!(equalized, negrestore_core::run(&input, &params));

    let direct = equalize_lightness(&input, &LightnessEqualization::default());
    assert_eq!((direct.width(), direct.height()), (24, 30));
    assert_ne!(direct, input);
    assert_eq!(default, negrestore_core::run(&input, &CorrectionParams::default()));
}

#[test]
fn test_process_file_picks_encoding_from_extension() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path();
    let input = dir.join("in.png");
    std::fs::write(&input, encode(&orange_negative(10, 10), OutputFormat::Png).unwrap()).unwrap();

    let png_out = dir.join("out.png");
    let jpg_out = dir.join("out.jpg");
    let params = CorrectionParams::default();
    negrestore_core::process_file(&input, &png_out, &params).unwrap();
    negrestore_core::process_file(&input, &jpg_out, &params).unwrap();

    assert_eq!(&std::fs::read(&png_out).unwrap()[1..4], b"PNG");
    assert_eq!(&std::fs::read(&jpg_out).unwrap()[..2], &[0xFF, 0xD8]);

    let missing = negrestore_core::process_file(&dir.join("missing.png"), &png_out, &params);
    assert!(matches!(missing, Err(EngineError::Io { .. })));
}
