//! Color value type and perceptual conversions
//!
//! Everything that computes distances between colors goes through
//! [`conversion::delta_e`] so the metric stays uniform across the crate.

pub mod conversion;

pub use conversion::{delta_e, delta_e_squared, Color};
