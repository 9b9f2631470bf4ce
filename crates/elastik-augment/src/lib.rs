//! Random elastic deformation for data augmentation.
//!
//! Draws smooth random displacement grids and applies them with
//! [`elastik_core::deform_grid`] to batches of `ndarray` arrays or Burn
//! tensors, so that an image and its label mask receive the same warp.

pub mod config;
pub mod crop;
pub mod elastic;
pub mod error;
pub mod random;
pub mod tensor;

pub use config::ElasticConfig;
pub use crop::Crop;
pub use elastic::{Deformed, ElasticDeform};
pub use error::{AugmentError, Result};
pub use random::{GridPoints, RandomGrid};
pub use tensor::{deform_tensors, deform_tensors_random, tensor_to_array};
