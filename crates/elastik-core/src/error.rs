//! Error types for deformation operations.
//!
//! Every failure is reported before any output buffer is written, so callers
//! can fix their inputs and re-invoke without cleaning up partial results.

use std::collections::TryReserveError;

use thiserror::Error;

/// Main error type for the deformation kernel.
#[derive(Error, Debug)]
pub enum DeformError {
    /// Channel sizes, displacement grid shape or offset length disagree.
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Spline order or boundary mode outside the supported range.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// An output buffer was handed over without write access.
    #[error("Output array of channel {channel} is read-only")]
    ReadOnlyOutput { channel: usize },

    /// A working buffer could not be reserved.
    #[error("Failed to allocate working buffer of {elements} elements")]
    AllocationFailure {
        elements: usize,
        #[source]
        source: TryReserveError,
    },
}

/// Result type for deformation operations.
pub type Result<T> = std::result::Result<T, DeformError>;

impl DeformError {
    /// Create a shape mismatch error.
    pub fn shape_mismatch(msg: impl Into<String>) -> Self {
        Self::ShapeMismatch(msg.into())
    }

    /// Create an invalid parameter error.
    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }
}

impl From<ndarray::ShapeError> for DeformError {
    fn from(err: ndarray::ShapeError) -> Self {
        Self::ShapeMismatch(err.to_string())
    }
}
