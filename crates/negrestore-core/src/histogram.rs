//! 256-bin sample histograms, equalization tables, and percentiles.

use crate::image::{Channel, PixelBuffer};

/// Number of bins for 8-bit samples.
pub const BINS: usize = 256;

/// Sample counts for one 8-bit channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    bins: [u64; BINS],
    total: u64,
}

impl Histogram {
    /// Count every sample yielded by `samples`.
    pub fn from_samples(samples: impl IntoIterator<Item = u8>) -> Self {
        let mut bins = [0u64; BINS];
        let mut total = 0u64;
        for v in samples {
            bins[v as usize] += 1;
            total += 1;
        }
        Self { bins, total }
    }

    /// Histogram of a single channel of `buffer`.
    pub fn of_channel(buffer: &PixelBuffer, channel: Channel) -> Self {
        Self::from_samples(buffer.channel(channel))
    }

    /// Per-bin counts.
    pub fn bins(&self) -> &[u64; BINS] {
        &self.bins
    }

    /// Number of samples counted.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Lowest occupied bin, `None` when empty.
    pub fn first_occupied(&self) -> Option<u8> {
        self.bins.iter().position(|&c| c > 0).map(|i| i as u8)
    }

    /// Lookup table that flattens this distribution across `[0, 255]`.
    ///
    /// The lowest occupied value maps to 0 and the rest follow the
    /// cumulative distribution of the remaining samples:
    ///
    /// ```text
    /// lut[j] = round(255 × (cdf(j) − hist[i0]) / (N − hist[i0]))
    /// ```
    ///
    /// An empty or single-valued histogram yields the identity table.
    pub fn equalization_lut(&self) -> [u8; BINS] {
        let mut lut = identity_lut();
        let Some(i0) = self.first_occupied() else {
            return lut;
        };
        let i0 = i0 as usize;
        let base = self.bins[i0];
        if base == self.total {
            return lut;
        }

        let scale = 255.0 / (self.total - base) as f64;
        lut[..=i0].fill(0);
        let mut sum = 0u64;
        for j in i0 + 1..BINS {
            sum += self.bins[j];
            lut[j] = (sum as f64 * scale).round().min(255.0) as u8;
        }
        lut
    }

    /// Value of the `rank`-th smallest sample (0-based). Ranks past the end
    /// return the largest sample.
    pub fn value_at_rank(&self, rank: u64) -> u8 {
        let mut seen = 0u64;
        let mut last = 0u8;
        for (value, &count) in self.bins.iter().enumerate() {
            if count == 0 {
                continue;
            }
            last = value as u8;
            seen += count;
            if seen > rank {
                return last;
            }
        }
        last
    }

    /// Percentile `p` ∈ [0, 100] with linear interpolation between the two
    /// nearest ranked samples.
    ///
    /// ```text
    /// r = p / 100 × (N − 1)
    /// value = a[⌊r⌋] + (a[⌈r⌉] − a[⌊r⌋]) × (r − ⌊r⌋)
    /// ```
    ///
    /// Returns 0.0 for an empty histogram.
    pub fn percentile(&self, p: f64) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let rank = (p.clamp(0.0, 100.0) / 100.0) * (self.total - 1) as f64;
        let lo = rank.floor();
        let hi = rank.ceil();
        let a_lo = self.value_at_rank(lo as u64) as f64;
        let a_hi = self.value_at_rank(hi as u64) as f64;
        a_lo + (a_hi - a_lo) * (rank - lo)
    }

    /// Number of samples strictly below `lo` or strictly above `hi`.
    pub fn count_outside(&self, lo: u8, hi: u8) -> u64 {
        let below: u64 = self.bins[..lo as usize].iter().sum();
        let above: u64 = self.bins[(hi as usize + 1).min(BINS)..].iter().sum();
        below + above
    }
}

/// The table that maps every value to itself.
pub fn identity_lut() -> [u8; BINS] {
    std::array::from_fn(|i| i as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equalization_of_constant_is_identity() {
        let hist = Histogram::from_samples([77u8; 10]);
        assert_eq!(hist.equalization_lut(), identity_lut());
    }

    #[test]
    fn test_equalization_of_empty_is_identity() {
        let hist = Histogram::from_samples(std::iter::empty());
        assert_eq!(hist.equalization_lut(), identity_lut());
    }

    #[test]
    fn test_equalization_two_values_spreads_to_extremes() {
        let hist = Histogram::from_samples([10u8, 10, 20, 20]);
        let lut = hist.equalization_lut();
        assert_eq!(lut[10], 0);
        assert_eq!(lut[20], 255);
    }

    #[test]
    fn test_equalization_uniform_ramp() {
        // Five equally populated values: first maps to 0, the rest step by 255/4.
        let hist = Histogram::from_samples([50u8, 60, 70, 80, 90]);
        let lut = hist.equalization_lut();
        assert_eq!(lut[50], 0);
        assert_eq!(lut[60], 64);
        assert_eq!(lut[70], 128);
        assert_eq!(lut[80], 191);
        assert_eq!(lut[90], 255);
    }

    #[test]
    fn test_equalization_is_monotonic() {
        let samples: Vec<u8> = (0..1000u32).map(|i| ((i * 37) % 200) as u8).collect();
        let lut = Histogram::from_samples(samples).equalization_lut();
        assert!(lut.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_percentile_interpolates_linearly() {
        // Sorted: [0, 10, 20, 30]; rank for p=50 is 1.5 → 15.
        let hist = Histogram::from_samples([30u8, 0, 20, 10]);
        assert_eq!(hist.percentile(50.0), 15.0);
        assert_eq!(hist.percentile(0.0), 0.0);
        assert_eq!(hist.percentile(100.0), 30.0);
        // rank 3 × 0.05 = 0.15 → 1.5
        assert!((hist.percentile(5.0) - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_percentile_of_constant_is_that_value() {
        let hist = Histogram::from_samples([42u8; 7]);
        assert_eq!(hist.percentile(5.0), 42.0);
        assert_eq!(hist.percentile(99.0), 42.0);
    }

    #[test]
    fn test_value_at_rank() {
        let hist = Histogram::from_samples([5u8, 5, 9, 200]);
        assert_eq!(hist.value_at_rank(0), 5);
        assert_eq!(hist.value_at_rank(1), 5);
        assert_eq!(hist.value_at_rank(2), 9);
        assert_eq!(hist.value_at_rank(3), 200);
        assert_eq!(hist.value_at_rank(99), 200);
    }

    #[test]
    fn test_count_outside() {
        let hist = Histogram::from_samples([0u8, 1, 2, 3, 254, 255]);
        assert_eq!(hist.count_outside(2, 254), 3);
        assert_eq!(hist.count_outside(0, 255), 0);
    }
}
