//! Central parameter struct that defines the whole correction recipe.
//!
//! `CorrectionParams` is the single source of truth for every stage. It is
//! built once per process (defaults or a JSON file) and passed by reference
//! into each pipeline call.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ParamsError;

/// Percentile window kept by the histogram clipper for one channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClipWindow {
    /// Lower percentile, `[0, 100]`. Default: 5.
    pub low: f64,
    /// Upper percentile, `[0, 100]`. Default: 99.
    pub high: f64,
}

impl Default for ClipWindow {
    fn default() -> Self {
        Self {
            low: 5.0,
            high: 99.0,
        }
    }
}

/// Red/yellow cast attenuation in Lab.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChromaParams {
    /// Scale applied to red excess above the neutral midpoint. Default: 0.6.
    pub red_intensity: f32,
    /// Scale applied to yellow excess above `yellow_threshold`. Default: 0.9.
    pub yellow_intensity: f32,
    /// Encoded b-axis value above which yellow is attenuated. Default: 100.
    pub yellow_threshold: f32,
}

impl Default for ChromaParams {
    fn default() -> Self {
        Self {
            red_intensity: 0.6,
            yellow_intensity: 0.9,
            yellow_threshold: 100.0,
        }
    }
}

/// Contrast-limited adaptive equalization of Lab lightness.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightnessEqualization {
    /// Histogram clip limit relative to a uniform bin. Default: 1.0.
    pub clip_limit: f32,
    /// Tile columns. Default: 1.
    pub tiles_x: u32,
    /// Tile rows. Default: 10.
    pub tiles_y: u32,
}

impl Default for LightnessEqualization {
    fn default() -> Self {
        Self {
            clip_limit: 1.0,
            tiles_x: 1,
            tiles_y: 10,
        }
    }
}

/// Every stage reads from here. Fields missing from a JSON file keep their
/// defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrectionParams {
    /// Percentile windows per channel `[R, G, B]`.
    pub clip: [ClipWindow; 3],
    /// Output ceiling of the range normalizer. Default: 245.
    pub normalize_ceiling: u8,
    /// Multiplicative gains per channel `[R, G, B]`. Default: `[0.9, 0.85, 1.0]`.
    pub gains: [f32; 3],
    /// Red/yellow attenuation.
    pub chroma: ChromaParams,
    /// Optional lightness equalization between normalization and balancing.
    /// Default: off.
    pub lightness_equalization: Option<LightnessEqualization>,
}

impl Default for CorrectionParams {
    fn default() -> Self {
        Self {
            clip: [ClipWindow::default(); 3],
            normalize_ceiling: 245,
            gains: [0.9, 0.85, 1.0],
            chroma: ChromaParams::default(),
            lightness_equalization: None,
        }
    }
}

impl CorrectionParams {
    /// Parse and validate a JSON parameter document.
    pub fn from_json(json: &str) -> Result<Self, ParamsError> {
        let params: Self = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    /// Read, parse, and validate a JSON parameter file.
    pub fn load(path: &Path) -> Result<Self, ParamsError> {
        let json = std::fs::read_to_string(path).map_err(|source| ParamsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let params = Self::from_json(&json)?;
        tracing::info!(path = %path.display(), "loaded correction parameters");
        Ok(params)
    }

    /// Pretty JSON rendering, suitable as a starting point for a file.
    pub fn to_json_pretty(&self) -> String {
        // Plain data with string keys; serialization cannot fail.
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Check every field against its usable range.
    pub fn validate(&self) -> Result<(), ParamsError> {
        for window in &self.clip {
            if !(0.0..=100.0).contains(&window.low) || !(0.0..=100.0).contains(&window.high) {
                return Err(out_of_range("clip", "percentiles must be within [0, 100]"));
            }
            if window.low > window.high {
                return Err(out_of_range("clip", "low percentile exceeds high percentile"));
            }
        }
        if self.normalize_ceiling == 0 {
            return Err(out_of_range("normalize_ceiling", "must be at least 1"));
        }
        if self.gains.iter().any(|g| !g.is_finite() || *g < 0.0) {
            return Err(out_of_range("gains", "must be finite and non-negative"));
        }
        let chroma = &self.chroma;
        for (field, v) in [
            ("chroma.red_intensity", chroma.red_intensity),
            ("chroma.yellow_intensity", chroma.yellow_intensity),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(out_of_range(field, "must be finite and non-negative"));
            }
        }
        if !(0.0..=255.0).contains(&chroma.yellow_threshold) {
            return Err(out_of_range("chroma.yellow_threshold", "must be within [0, 255]"));
        }
        if let Some(eq) = &self.lightness_equalization {
            if eq.tiles_x == 0 || eq.tiles_y == 0 {
                return Err(out_of_range("lightness_equalization", "tile counts must be positive"));
            }
            if !eq.clip_limit.is_finite() || eq.clip_limit <= 0.0 {
                return Err(out_of_range("lightness_equalization.clip_limit", "must be positive"));
            }
        }
        Ok(())
    }
}

fn out_of_range(field: &'static str, reason: &str) -> ParamsError {
    ParamsError::OutOfRange {
        field,
        reason: reason.to_string(),
    }
}
