//! Elastic grid deformation of channel batches.

pub mod channel;
pub mod coded;
pub mod orchestrator;
pub mod validation;

pub use channel::{Channel, ChannelParams, DeformChannel};
pub use coded::{deform_grid_coded, InputArray, OutputArray, OutputBuffer};
pub use orchestrator::deform_grid;
pub use validation::{validate_call, CallGeometry};
