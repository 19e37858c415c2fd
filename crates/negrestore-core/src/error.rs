use std::path::PathBuf;

/// Errors surfaced by the restoration engine.
///
/// Only decoding, encoding, and file I/O can fail; the correction stages
/// themselves are total over a valid [`PixelBuffer`](crate::PixelBuffer).
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),
    #[error("failed to encode image: {0}")]
    Encode(#[source] image::ImageError),
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    InvalidParams(#[from] ParamsError),
}

impl EngineError {
    /// True when the input bytes themselves were at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Decode(_))
    }
}

/// A correction parameter set that cannot be used.
#[derive(Debug, thiserror::Error)]
pub enum ParamsError {
    #[error("invalid parameter `{field}`: {reason}")]
    OutOfRange { field: &'static str, reason: String },
    #[error("malformed parameter file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("cannot read parameter file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
