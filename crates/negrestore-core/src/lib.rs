//! Negative Restore Core: the color-negative restoration engine.
//!
//! This crate contains the pixel buffer, the correction stages, and the
//! pipeline that sequences them. No storage, networking, or runtime
//! dependencies.

pub mod codec;
pub mod color;
pub mod correction;
pub mod error;
pub mod histogram;
pub mod image;
pub mod transform;

// Re-exports for convenience.
pub use codec::{OutputFormat, decode, encode};
pub use error::{EngineError, ParamsError};
pub use crate::image::{Channel, PixelBuffer};
pub use transform::params::CorrectionParams;
pub use transform::pipeline::{correct, process, process_file, run};
