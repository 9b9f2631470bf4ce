//! Coordinate transforms.
//!
//! Maps every output element to the input-space coordinate it samples from.

pub mod coordinates;

pub use coordinates::{CoordinateField, CoordinateFieldBuilder};
