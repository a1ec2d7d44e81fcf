//! Error types for the harness.
//!
//! These describe programmer or setup mistakes (a malformed validation shape,
//! an unparsable URI, a header that is not valid HTTP). They are never used to
//! report a failed expectation; assertions panic instead.

use thiserror::Error;

/// Result type alias using [`HarnessError`].
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Errors raised by the harness while building requests or decoding outputs.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Request building failed.
    #[error("Request build error: {0}")]
    RequestBuild(String),

    /// Response body could not be read as requested.
    #[error("Body read error: {0}")]
    BodyRead(String),

    /// JSON serialization or deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Header name or value is invalid.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// A decoded validation error does not follow the expected shape.
    #[error("Malformed validation error at position {position}: {reason}")]
    MalformedRecord {
        /// Position of the offending error in the decoded list.
        position: usize,
        /// What was wrong with it.
        reason: String,
    },
}

impl HarnessError {
    /// Creates a malformed record error.
    pub fn malformed_record(position: usize, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            position,
            reason: reason.into(),
        }
    }
}

impl From<http::Error> for HarnessError {
    fn from(e: http::Error) -> Self {
        Self::RequestBuild(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = HarnessError::RequestBuild("Invalid URI".to_string());
        assert_eq!(err.to_string(), "Request build error: Invalid URI");

        let err = HarnessError::malformed_record(3, "2 wildcards but 1 index");
        assert_eq!(
            err.to_string(),
            "Malformed validation error at position 3: 2 wildcards but 1 index"
        );
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: HarnessError = json_err.into();
        assert!(matches!(err, HarnessError::Json(_)));
        assert!(std::error::Error::source(&err).is_some());
    }
}
