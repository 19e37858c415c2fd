//! Per-channel histogram equalization followed by percentile clipping.
//!
//! # Algorithm
//! For each of R, G, B independently:
//! 1. Equalize the channel so its cumulative distribution is roughly uniform
//! 2. Take the low/high percentiles of the equalized samples
//! 3. Clamp every sample into that window
//!
//! Fractional percentile bounds are truncated to integers. Clamping an
//! integer sample to a real window and truncating back to 8 bits gives the
//! same result as clamping to `[⌊low⌋, ⌊high⌋]`.

use crate::histogram::Histogram;
use crate::image::{Channel, PixelBuffer};
use crate::transform::params::ClipWindow;

/// What the clipper did to each channel `[R, G, B]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClipReport {
    /// Inclusive sample window kept per channel.
    pub windows: [(u8, u8); 3],
    /// Samples that fell outside the window per channel.
    pub clipped: [u64; 3],
}

impl ClipReport {
    /// Clipped samples summed over all channels.
    pub fn total_clipped(&self) -> u64 {
        self.clipped.iter().sum()
    }
}

/// Equalize then clip every channel to its percentile window.
pub fn clip_histogram(buffer: &PixelBuffer, windows: &[ClipWindow; 3]) -> (PixelBuffer, ClipReport) {
    let mut report = ClipReport::default();
    let mut luts = [[0u8; 256]; 3];

    for channel in Channel::ALL {
        let c = channel.index();
        let equalize = Histogram::of_channel(buffer, channel).equalization_lut();
        let equalized = Histogram::from_samples(buffer.channel(channel).map(|v| equalize[v as usize]));

        let (lo, hi) = window_bounds(&equalized, windows[c]);
        report.windows[c] = (lo, hi);
        report.clipped[c] = equalized.count_outside(lo, hi);

        for (v, out) in luts[c].iter_mut().enumerate() {
            *out = equalize[v].clamp(lo, hi);
        }

        tracing::trace!(%channel, lo, hi, clipped = report.clipped[c], "clipped channel");
    }

    (buffer.map_channels(&luts), report)
}

/// Integer clamp window for one equalized channel.
fn window_bounds(equalized: &Histogram, window: ClipWindow) -> (u8, u8) {
    let lo = equalized.percentile(window.low).floor() as u8;
    let hi = equalized.percentile(window.high).floor() as u8;
    (lo, hi.max(lo))
}
