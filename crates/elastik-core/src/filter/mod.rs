//! Image filters.
//!
//! Spline prefiltering and coordinate-field resampling.

pub mod prefilter;
pub mod resample;

pub use prefilter::SplinePrefilter;
pub use resample::Resampler;
