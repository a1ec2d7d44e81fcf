//! # Gauntlet Core
//!
//! Core types and traits shared by the gauntlet crates.
//!
//! - [`HarnessError`] - Setup and decoding errors raised by the harness itself
//! - [`ErrorCode`] - Capability of an error-kind type to expose its numeric code
//! - [`ErrorMeta`] - A ready-made `code` + `message` error kind
//! - [`wire`] - Constants of the response wire convention under test

#![doc(html_root_url = "https://docs.rs/gauntlet-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod code;
mod error;
pub mod wire;

pub use code::{ErrorCode, ErrorMeta};
pub use error::{HarnessError, HarnessResult};
