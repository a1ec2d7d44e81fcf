//! # Gauntlet Validation
//!
//! Matching of structured validation errors against expectations written as
//! dotted field paths.
//!
//! A validation result from the system under test is decoded once into a list
//! of [`ValidationErrorRecord`]s. Each record names its field as segments, with
//! array positions written as the wildcard `#` and the concrete positions kept
//! aside in `indexes`:
//!
//! ```json
//! {"code": 1002, "fields": ["items", "#", "name"], "indexes": [2]}
//! ```
//!
//! An expectation such as `"items.2.name"` is parsed into a [`FieldPath`] and
//! compared segment by segment, substituting indexes for wildcards.
//!
//! ## Example
//!
//! ```
//! use gauntlet_validation::ValidationMatcher;
//! use serde_json::json;
//!
//! let errors = vec![
//!     json!({"code": 1001, "fields": ["name"]}),
//!     json!({"code": 1002, "fields": ["items", "#", "name"], "indexes": [2]}),
//!     json!({"code": 1003, "data": {"max": 10}}),
//! ];
//!
//! ValidationMatcher::decode(&errors)
//!     .expect_field("name", 1001_u32)
//!     .expect_field("items.2.name", 1002_u32)
//!     .expect_fieldless_with_data(1003_u32, &json!({"max": 10}))
//!     .expect_no_errors_on(["email", "items.1.name"]);
//! ```

#![doc(html_root_url = "https://docs.rs/gauntlet-validation/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod matcher;
mod path;
mod record;

pub use matcher::ValidationMatcher;
pub use path::{FieldPath, Segment, WILDCARD};
pub use record::{ValidationErrorRecord, ValidationResult};
