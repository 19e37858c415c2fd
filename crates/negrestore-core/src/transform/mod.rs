//! Parameters and the pipeline that applies them.

pub mod params;
pub mod pipeline;
