//! Error types for augmentation.

use elastik_core::DeformError;
use thiserror::Error;

/// Main error type for elastic augmentation.
#[derive(Error, Debug)]
pub enum AugmentError {
    /// The deformation kernel rejected the call.
    #[error(transparent)]
    Deform(#[from] DeformError),

    /// Configuration values outside their valid range.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Configuration text could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Result type for augmentation.
pub type Result<T> = std::result::Result<T, AugmentError>;

impl AugmentError {
    /// Create an invalid configuration error.
    pub fn invalid_configuration(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AugmentError::invalid_configuration("sigma must be finite");
        assert_eq!(err.to_string(), "Invalid configuration: sigma must be finite");

        let err = AugmentError::from(DeformError::ReadOnlyOutput { channel: 1 });
        assert_eq!(err.to_string(), "Output array of channel 1 is read-only");
    }

    #[test]
    fn test_parse_error_conversion() {
        let err = serde_json::from_str::<u8>("nope").unwrap_err();
        assert!(matches!(AugmentError::from(err), AugmentError::Parse(_)));
    }
}
