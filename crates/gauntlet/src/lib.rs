//! # Gauntlet
//!
//! **Test-support toolkit for HTTP handlers and their validation errors**
//!
//! Gauntlet dispatches synthetic requests through handler functions in
//! memory and asserts on what comes back:
//!
//! - **Request harness** – build a request, run a handler, capture the response
//! - **Response assertions** – status classes, body codes, headers, JSON fields
//! - **Validation matching** – dotted field paths with `#` array wildcards
//! - **Log capture** – scoped redirection of `tracing` output
//! - **Configuration** – request defaults, validation convention and storage
//!   backend, layered from file and environment
//!
//! ## Quick Start
//!
//! ```
//! use gauntlet::prelude::*;
//! use serde_json::json;
//!
//! const REQUIRED: ErrorMeta = ErrorMeta::new(1001, "required");
//!
//! fn create(_req: &SyntheticRequest, res: &mut ResponseWriter) {
//!     JsonResponse::validation_failed([json!({"field": "name", "code": REQUIRED.code})])
//!         .write_to(res);
//! }
//!
//! let response = req().project_id("p1").post(create);
//! response.expect_validation([("name", REQUIRED.code)]);
//! response.validation().expect_field("name", REQUIRED);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! RequestBuilder → handler(SyntheticRequest, ResponseWriter) → CapturedResponse
//!                                                                   ↓
//!                             ValidationMatcher ← assertions ←──────┘
//! ```

#![doc(html_root_url = "https://docs.rs/gauntlet/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use gauntlet_core as core;

// Re-export validation matching
pub use gauntlet_validation as validation;

// Re-export the request harness
pub use gauntlet_test as harness;

// Re-export log setup and capture
pub use gauntlet_telemetry as telemetry;

// Re-export configuration
pub use gauntlet_config as config;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```
/// use gauntlet::prelude::*;
///
/// req().get(|_: &SyntheticRequest, _: &mut ResponseWriter| {}).ok();
/// ```
pub mod prelude {
    pub use gauntlet_core::{ErrorCode, ErrorMeta, HarnessError, HarnessResult};

    // Validation matching
    pub use gauntlet_validation::{
        FieldPath, ValidationErrorRecord, ValidationMatcher, ValidationResult,
    };

    // Request harness
    pub use gauntlet_test::{
        req, req_with_env, CapturedResponse, EnvRequestBuilder, Harness, JsonResponse,
        RequestBuilder, ResponseWriter, ServerError, SyntheticRequest, WriteResponse,
    };

    // Log capture
    pub use gauntlet_telemetry::{capture_logs, init_test_logging, LogCapture};

    // Configuration
    pub use gauntlet_config::{ConfigLoader, HarnessConfig};
}
