//! Error-kind codes.
//!
//! Systems under test describe each kind of validation or API error with a
//! numeric code. Expectations are written against those kinds rather than
//! bare numbers, so the harness only asks a kind to expose its code.

use serde::Serialize;
use std::fmt;

/// An error kind that exposes its numeric code.
///
/// # Example
///
/// ```
/// use gauntlet_core::ErrorCode;
///
/// struct Required;
///
/// impl ErrorCode for Required {
///     fn code(&self) -> u32 {
///         1001
///     }
/// }
///
/// assert_eq!(Required.code(), 1001);
/// assert_eq!(1001_u32.code(), 1001);
/// ```
pub trait ErrorCode {
    /// Returns the numeric code of this error kind.
    fn code(&self) -> u32;
}

impl ErrorCode for u32 {
    fn code(&self) -> u32 {
        *self
    }
}

impl ErrorCode for u16 {
    fn code(&self) -> u32 {
        u32::from(*self)
    }
}

impl<T: ErrorCode + ?Sized> ErrorCode for &T {
    fn code(&self) -> u32 {
        (**self).code()
    }
}

/// A static error kind: a code plus a human-readable message.
///
/// Declared as constants by the system under test and reused by its tests.
///
/// ```
/// use gauntlet_core::{ErrorCode, ErrorMeta};
///
/// const REQUIRED: ErrorMeta = ErrorMeta::new(1001, "required");
/// assert_eq!(REQUIRED.code(), 1001);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ErrorMeta {
    /// Numeric code.
    pub code: u32,
    /// Message shown alongside the code.
    #[serde(rename = "error")]
    pub message: &'static str,
}

impl ErrorMeta {
    /// Creates a new error kind.
    pub const fn new(code: u32, message: &'static str) -> Self {
        Self { code, message }
    }
}

impl ErrorCode for ErrorMeta {
    fn code(&self) -> u32 {
        self.code
    }
}

impl fmt::Display for ErrorMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOO_LONG: ErrorMeta = ErrorMeta::new(1003, "too long");

    #[test]
    fn test_primitive_codes() {
        assert_eq!(5_u32.code(), 5);
        assert_eq!(7_u16.code(), 7);
        assert_eq!((&9_u32).code(), 9);
    }

    #[test]
    fn test_meta_code() {
        assert_eq!(TOO_LONG.code(), 1003);
        assert_eq!(TOO_LONG.to_string(), "too long (1003)");
    }

    #[test]
    fn test_meta_serializes_like_wire_error() {
        let json = serde_json::to_value(TOO_LONG).unwrap();
        assert_eq!(json, serde_json::json!({"code": 1003, "error": "too long"}));
    }
}
