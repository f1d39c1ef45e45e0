//! Error types for stub validation and decoding.

use thiserror::Error;

/// A single problem found while validating a stub.
///
/// Validation accumulates every problem into a `Vec<ValidationError>` so a
/// caller can report them all at once instead of fixing one at a time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The stub request has no HTTP method.
    #[error("method is required")]
    MissingMethod,

    /// The stub request method is not one of the canonical HTTP methods.
    #[error("method {0} is not valid")]
    InvalidMethod(String),

    /// The stub request has no path.
    #[error("path is required")]
    MissingPath,

    /// The stub response status code is outside [200, 599].
    #[error("status code {0} is not valid")]
    InvalidStatusCode(u16),
}

/// Raised when a stub definition is neither valid JSON nor valid YAML.
#[derive(Debug, Error)]
#[error("stub is not valid JSON ({json}) nor YAML ({yaml})")]
pub struct DecodeError {
    /// Error from the JSON attempt.
    pub json: serde_json::Error,
    /// Error from the YAML fallback.
    pub yaml: serde_yaml::Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_messages() {
        assert_eq!(ValidationError::MissingMethod.to_string(), "method is required");
        assert_eq!(
            ValidationError::InvalidMethod("INVALID".to_string()).to_string(),
            "method INVALID is not valid"
        );
        assert_eq!(ValidationError::MissingPath.to_string(), "path is required");
        assert_eq!(
            ValidationError::InvalidStatusCode(700).to_string(),
            "status code 700 is not valid"
        );
    }
}
