//! # Gauntlet Test
//!
//! In-memory dispatch of synthetic HTTP requests through handler functions,
//! with fluent assertions on what they respond.
//!
//! No server, router or network is involved: a handler is any function that
//! reads a [`SyntheticRequest`] and either writes into a [`ResponseWriter`] or
//! returns something that can be written ([`WriteResponse`]).
//!
//! ## Key Features
//!
//! - **Request Builder**: method, path, multi-valued query, headers, host and
//!   JSON/form/raw bodies, with defaults for everything
//! - **Two Handler Shapes**: plain `(request, writer)` handlers and
//!   env-carrying `(request, env) -> Result<response, error>` handlers
//! - **Response Decoding**: best-effort JSON plus field-keyed validation errors
//! - **Assertions**: status classes, body codes, batched validation checks,
//!   headers and JSON fields
//!
//! ## Example
//!
//! ```
//! use gauntlet_test::{req, JsonResponse, ResponseWriter, SyntheticRequest, WriteResponse};
//! use serde_json::json;
//!
//! fn create_widget(req: &SyntheticRequest, res: &mut ResponseWriter) {
//!     let body: serde_json::Value = req.json().unwrap_or_default();
//!     if body["name"].as_str().unwrap_or_default().is_empty() {
//!         JsonResponse::validation_failed([json!({"field": "name", "code": 1001})])
//!             .write_to(res);
//!         return;
//!     }
//!     JsonResponse::created(json!({"name": body["name"]})).write_to(res);
//! }
//!
//! req()
//!     .project_id("p1")
//!     .json(&json!({"name": ""}))
//!     .post(create_widget)
//!     .expect_validation([("name", 1001)]);
//!
//! req()
//!     .json(&json!({"name": "gear"}))
//!     .post(create_widget)
//!     .ok()
//!     .assert_json_field("name", &json!("gear"));
//! ```

#![doc(html_root_url = "https://docs.rs/gauntlet-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod harness;
mod request;
mod response;
mod writer;

pub use harness::{req, req_with_env, EnvRequestBuilder, Harness};
pub use request::{RequestBuilder, SyntheticRequest};
pub use response::{CapturedResponse, ValidationLookup};
pub use writer::{JsonResponse, ResponseWriter, ServerError, WriteResponse};
