//! Elastic grid deformation of N-dimensional arrays.
//!
//! A coarse displacement grid is upsampled to one source coordinate per
//! output element, and every channel of a batch is resampled at those
//! coordinates with its own spline order and boundary mode.
//!
//! The pipeline per call:
//! 1. [`deform::validate_call`] checks the whole batch.
//! 2. [`transform::CoordinateFieldBuilder`] builds the shared field.
//! 3. [`filter::SplinePrefilter`] converts each channel to coefficients
//!    when its order needs it.
//! 4. [`filter::Resampler`] writes each output.

pub mod boundary;
pub mod buffer;
pub mod deform;
pub mod element;
pub mod error;
pub mod filter;
pub mod interpolation;
pub mod lattice;
pub mod transform;

pub use boundary::BoundaryMode;
pub use deform::{
    deform_grid, deform_grid_coded, Channel, ChannelParams, DeformChannel, InputArray, OutputArray,
    OutputBuffer,
};
pub use element::Sample;
pub use error::{DeformError, Result};
pub use interpolation::SplineOrder;
pub use transform::{CoordinateField, CoordinateFieldBuilder};
