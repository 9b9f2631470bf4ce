//! Interpolation types and operations.
//!
//! This module provides B-spline basis weights, the spline order type and a
//! separable evaluator for sampling values at continuous coordinates.

pub mod basis;
pub mod order;
pub mod spline;

pub use basis::spline_weights;
pub use order::{SplineOrder, MAX_ORDER, MAX_SUPPORT};
pub use spline::{SplineInterpolator, SupportBuffer};
