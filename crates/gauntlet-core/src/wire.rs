//! The response wire convention of the systems under test.
//!
//! Error responses carry a top-level numeric `code`. A failed validation is a
//! `400` whose code is [`VALIDATION_FAILED`] and whose `invalid` array lists
//! one `{field, code, ...}` object per problem:
//!
//! ```json
//! {"code": 2004, "invalid": [{"field": "name", "code": 1001, "error": "required"}]}
//! ```

use http::StatusCode;

/// Reserved code of a "validation failed" response.
pub const VALIDATION_FAILED: u32 = 2004;

/// Status code of a "validation failed" response.
pub const VALIDATION_STATUS: StatusCode = StatusCode::BAD_REQUEST;

/// Key of the top-level code in a JSON error body.
pub const CODE_KEY: &str = "code";

/// Key of the list of field errors in a validation failure body.
pub const INVALID_KEY: &str = "invalid";

/// Key naming the field inside one `invalid` entry.
pub const FIELD_KEY: &str = "field";

/// Host given to synthetic requests that do not set one.
pub const DEFAULT_HOST: &str = "test.gauntlet.local";

/// Header scoping a request to a project (tenant).
pub const PROJECT_HEADER: &str = "Gobl-Project";

/// Code of the generic server error written when a handler produces no response.
pub const SERVER_ERROR: u32 = 2001;

/// Message of the generic server error.
pub const SERVER_ERROR_MESSAGE: &str = "server error";
