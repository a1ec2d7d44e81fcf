//! Typed configuration for gauntlet.
//!
//! Settings that tests rarely change but a suite may need to adapt to the
//! system under test:
//!
//! - [`RequestConfig`] - Default host and project header of synthetic requests
//! - [`ValidationConfig`] - Status and code identifying a validation failure
//! - [`StorageConfig`] - Storage backend the suite runs against
//! - [`LoggingConfig`] - Test log level and format
//!
//! Configuration is layered (defaults → file → env) by [`ConfigLoader`].
//!
//! # Example
//!
//! ```no_run
//! use gauntlet_config::{ConfigLoader, HarnessConfig};
//!
//! # fn main() -> Result<(), gauntlet_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_defaults()
//!     .with_optional_file("gauntlet.toml")?
//!     .with_env_prefix("GAUNTLET")
//!     .load()?;
//!
//! println!("Requests go to: {}", config.request.host);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [request]
//! host = "api.test.local"
//! project_header = "Gobl-Project"
//!
//! [validation]
//! status = 400
//! failed_code = 2004
//!
//! [storage]
//! backend = "postgres"
//! postgres_url = "postgres://localhost:5432"
//!
//! [logging]
//! level = "debug"
//! format = "pretty"
//! ```
//!
//! # Environment Variable Overrides
//!
//! Values can be overridden with `PREFIX__SECTION__KEY`, for example
//! `GAUNTLET__REQUEST__HOST=api.test.local`. The storage backend also honours
//! the shorter `GAUNTLET_TEST_STORAGE`, `GAUNTLET_TEST_PG` and
//! `GAUNTLET_TEST_CR` variables (see [`StorageConfig::from_env`]).

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::{HarnessConfig, HarnessConfigBuilder};
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;
