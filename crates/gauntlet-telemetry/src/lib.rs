//! Logging for gauntlet test suites.
//!
//! - [`logging`]: subscriber setup for a whole test binary
//! - [`capture`]: scoped capture of log output, for asserting on what a
//!   handler logged
//!
//! # Example
//!
//! ```
//! use gauntlet_telemetry::capture::capture_logs;
//!
//! let (answer, logs) = capture_logs(|| {
//!     tracing::warn!(user_id = 7, "quota exceeded");
//!     42
//! });
//!
//! assert_eq!(answer, 42);
//! assert!(logs.contains("quota exceeded"));
//! assert!(logs.contains("user_id=7"));
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod capture;
mod error;
pub mod logging;

pub use capture::{capture_logs, LogCapture, LogSink};
pub use error::TelemetryError;
pub use logging::{init_logging, init_test_logging, LogConfig, LogFormat};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
