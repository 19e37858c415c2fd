//! Correction stages. Each one is a pure function from one buffer to a
//! new buffer of the same dimensions.

pub mod balance;
pub mod chroma;
pub mod histogram_clip;
pub mod invert;
pub mod lightness;
pub mod normalize;

pub use balance::balance_colors;
pub use chroma::correct_chroma;
pub use histogram_clip::{ClipReport, clip_histogram};
pub use invert::{invert, load_inverted};
pub use lightness::equalize_lightness;
pub use normalize::normalize_range;
