//! Color space conversions used by the correction stages.

pub mod lab;

pub use lab::{Lab8, NEUTRAL_CHROMA};
