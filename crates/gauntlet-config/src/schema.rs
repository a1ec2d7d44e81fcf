//! Configuration schema types.

use gauntlet_core::wire;
use gauntlet_telemetry::logging::LogConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;

use crate::ConfigError;

pub use gauntlet_telemetry::logging::LogFormat;

/// Environment variable selecting the storage backend.
pub const STORAGE_ENV: &str = "GAUNTLET_TEST_STORAGE";
/// Environment variable overriding the PostgreSQL connection root.
pub const POSTGRES_ENV: &str = "GAUNTLET_TEST_PG";
/// Environment variable overriding the CockroachDB connection root.
pub const COCKROACH_ENV: &str = "GAUNTLET_TEST_CR";

/// Defaults applied to every synthetic request.
///
/// # Example
///
/// ```
/// use gauntlet_config::RequestConfig;
///
/// let config = RequestConfig::default();
/// assert_eq!(config.host, "test.gauntlet.local");
/// assert_eq!(config.project_header, "Gobl-Project");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RequestConfig {
    /// Host of synthetic requests.
    #[serde(default = "default_host")]
    pub host: String,

    /// Header carrying the project identifier.
    #[serde(default = "default_project_header")]
    pub project_header: String,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            project_header: default_project_header(),
        }
    }
}

fn default_host() -> String {
    wire::DEFAULT_HOST.to_string()
}

fn default_project_header() -> String {
    wire::PROJECT_HEADER.to_string()
}

/// How a validation failure is recognised on the wire.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ValidationConfig {
    /// HTTP status of a validation failure.
    #[serde(default = "default_validation_status")]
    pub status: u16,

    /// Top-level body `code` of a validation failure.
    #[serde(default = "default_failed_code")]
    pub failed_code: u32,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            status: default_validation_status(),
            failed_code: default_failed_code(),
        }
    }
}

fn default_validation_status() -> u16 {
    wire::VALIDATION_STATUS.as_u16()
}

fn default_failed_code() -> u32 {
    wire::VALIDATION_FAILED
}

/// Storage backend a test suite runs against.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Embedded SQLite.
    #[default]
    Sqlite,
    /// PostgreSQL.
    Postgres,
    /// CockroachDB.
    Cockroach,
}

impl StorageBackend {
    /// Returns the lowercase backend name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Postgres => "postgres",
            Self::Cockroach => "cockroach",
        }
    }

    /// Reads the backend from `GAUNTLET_TEST_STORAGE`.
    ///
    /// Unset or empty selects SQLite. Any value other than `sqlite`,
    /// `postgres` or `cockroach` (case-insensitive) is an error.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup(STORAGE_ENV) {
            None => Ok(Self::Sqlite),
            Some(value) if value.is_empty() => Ok(Self::Sqlite),
            Some(value) => value
                .parse()
                .map_err(|reason: String| ConfigError::env_parse_error(STORAGE_ENV, reason)),
        }
    }
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "postgres" => Ok(Self::Postgres),
            "cockroach" => Ok(Self::Cockroach),
            other => Err(format!(
                "unknown storage backend '{other}', expected 'sqlite', 'postgres' or 'cockroach'"
            )),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage used by suites that need a database.
///
/// # Example
///
/// ```
/// use gauntlet_config::{StorageBackend, StorageConfig};
///
/// let config = StorageConfig {
///     backend: StorageBackend::Postgres,
///     ..Default::default()
/// };
/// assert_eq!(
///     config.url().as_deref(),
///     Some("postgres://localhost:5432/gauntlet_test")
/// );
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Selected backend.
    #[serde(default)]
    pub backend: StorageBackend,

    /// PostgreSQL connection root, without database name.
    #[serde(default = "default_postgres_url")]
    pub postgres_url: String,

    /// CockroachDB connection root, without database name.
    #[serde(default = "default_cockroach_url")]
    pub cockroach_url: String,

    /// Database name appended to the connection root.
    #[serde(default = "default_database")]
    pub database: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            postgres_url: default_postgres_url(),
            cockroach_url: default_cockroach_url(),
            database: default_database(),
        }
    }
}

impl StorageConfig {
    /// Builds the storage configuration from the process environment.
    ///
    /// See [`StorageBackend::from_env`]; `GAUNTLET_TEST_PG` and
    /// `GAUNTLET_TEST_CR` replace the connection roots when set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self {
            backend: StorageBackend::from_lookup(&lookup)?,
            ..Self::default()
        };
        if let Some(url) = lookup(POSTGRES_ENV).filter(|v| !v.is_empty()) {
            config.postgres_url = url;
        }
        if let Some(url) = lookup(COCKROACH_ENV).filter(|v| !v.is_empty()) {
            config.cockroach_url = url;
        }
        Ok(config)
    }

    /// PostgreSQL connection string including the database.
    pub fn postgres(&self) -> String {
        format!("{}/{}", self.postgres_url, self.database)
    }

    /// CockroachDB connection string including the database.
    pub fn cockroach(&self) -> String {
        format!("{}/{}", self.cockroach_url, self.database)
    }

    /// Connection string of the selected backend; `None` for SQLite.
    pub fn url(&self) -> Option<String> {
        match self.backend {
            StorageBackend::Sqlite => None,
            StorageBackend::Postgres => Some(self.postgres()),
            StorageBackend::Cockroach => Some(self.cockroach()),
        }
    }
}

fn default_postgres_url() -> String {
    "postgres://localhost:5432".to_string()
}

fn default_cockroach_url() -> String {
    "postgres://root@localhost:26257".to_string()
}

fn default_database() -> String {
    "gauntlet_test".to_string()
}

/// Logging of test runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level or filter directive (e.g., "debug", "gauntlet_test=trace").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LoggingConfig {
    /// Converts the section into a [`LogConfig`] for `init_logging`.
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            level: self.level.clone(),
            format: self.format,
            ..LogConfig::test()
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> LogFormat {
    LogFormat::Compact
}
