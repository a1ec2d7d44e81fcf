//! Layered configuration loading.

use std::env;
use std::fs;
use std::path::Path;

use crate::schema::{COCKROACH_ENV, POSTGRES_ENV, STORAGE_ENV};
use crate::{ConfigError, HarnessConfig, LogFormat, StorageBackend};

/// Configuration loader with layered approach.
///
/// Later layers override earlier ones:
/// 1. Default values
/// 2. Configuration file (TOML or JSON)
/// 3. `GAUNTLET_TEST_*` storage variables
/// 4. Prefixed environment variables
///
/// # Example
///
/// ```no_run
/// use gauntlet_config::ConfigLoader;
///
/// # fn main() -> Result<(), gauntlet_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_defaults()
///     .with_file("gauntlet.toml")?
///     .with_storage_env()?
///     .with_env_prefix("GAUNTLET")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: HarnessConfig,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: HarnessConfig::default(),
            env_prefix: None,
        }
    }

    /// Start with default configuration values.
    ///
    /// This is what `new()` starts from, but can be chained for clarity.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = HarnessConfig::default();
        self
    }

    /// Start with the [`HarnessConfig::verbose`] preset.
    #[must_use]
    pub fn with_verbose(mut self) -> Self {
        self.config = HarnessConfig::verbose();
        self
    }

    /// Load configuration from a file.
    ///
    /// The format (TOML or JSON) is chosen by the file extension.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - The file does not exist
    /// - The file cannot be read
    /// - The file contains invalid TOML/JSON
    /// - The file contains unknown fields
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        self.config = Self::parse_file(&content, path)?;
        Ok(self)
    }

    /// Load configuration from a file if it exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be loaded.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from a string in the given format ("toml" or "json").
    ///
    /// # Example
    ///
    /// ```
    /// use gauntlet_config::ConfigLoader;
    ///
    /// let toml = r#"
    ///     [request]
    ///     host = "api.test.local"
    /// "#;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string(toml, "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.request.host, "api.test.local");
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = match format.to_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            _ => {
                return Err(ConfigError::validation_error(format!(
                    "unsupported configuration format: {format}"
                )))
            }
        };
        Ok(self)
    }

    /// Apply `GAUNTLET_TEST_STORAGE`, `GAUNTLET_TEST_PG` and `GAUNTLET_TEST_CR`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::EnvParseError` for an unknown storage backend.
    pub fn with_storage_env(mut self) -> Result<Self, ConfigError> {
        self.apply_storage_vars(|key| env::var(key).ok())?;
        Ok(self)
    }

    /// Set environment variable prefix for overrides.
    ///
    /// Variables use the format `PREFIX__SECTION__KEY`, e.g.
    /// `GAUNTLET__REQUEST__HOST=api.test.local` or
    /// `GAUNTLET__VALIDATION__FAILED_CODE=9000`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Load a `.env` file into the process environment, if one exists.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(e) if e.not_found() => Ok(self),
            Err(e) => Err(ConfigError::validation_error(format!(
                "failed to load .env file: {e}"
            ))),
        }
    }

    /// Apply environment overrides and validate the final configuration.
    pub fn load(mut self) -> Result<HarnessConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_overrides(&prefix)?;
        }

        self.config.validate()?;

        Ok(self.config)
    }

    /// Finalize without environment overrides or validation.
    #[must_use]
    pub fn load_unvalidated(self) -> HarnessConfig {
        self.config
    }

    fn parse_file(content: &str, path: &Path) -> Result<HarnessConfig, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        match extension.as_deref() {
            Some("toml") => Ok(toml::from_str(content)?),
            Some("json") => Ok(serde_json::from_str(content)?),
            _ => Err(ConfigError::validation_error(format!(
                "unsupported configuration file format: {}",
                path.display()
            ))),
        }
    }

    fn apply_storage_vars<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if lookup(STORAGE_ENV).is_some() {
            self.config.storage.backend = StorageBackend::from_lookup(&lookup)?;
        }
        if let Some(url) = lookup(POSTGRES_ENV).filter(|v| !v.is_empty()) {
            self.config.storage.postgres_url = url;
        }
        if let Some(url) = lookup(COCKROACH_ENV).filter(|v| !v.is_empty()) {
            self.config.storage.cockroach_url = url;
        }
        Ok(())
    }

    fn apply_env_overrides(&mut self, prefix: &str) -> Result<(), ConfigError> {
        let mut vars: Vec<(String, String)> = env::vars()
            .filter(|(k, _)| k.starts_with(prefix))
            .collect();
        // deterministic order when two spellings target the same key
        vars.sort();

        for (key, value) in vars {
            self.apply_env_var(&key, &value, prefix)?;
        }

        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let Some(rest) = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
        else {
            // GAUNTLET_TEST_* and other single-underscore names share the prefix
            return Ok(());
        };

        let parts: Vec<&str> = rest.split("__").collect();

        match parts.as_slice() {
            ["REQUEST", "HOST"] => {
                self.config.request.host = value.to_string();
            }
            ["REQUEST", "PROJECT_HEADER"] => {
                self.config.request.project_header = value.to_string();
            }

            ["VALIDATION", "STATUS"] => {
                self.config.validation.status = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))?;
            }
            ["VALIDATION", "FAILED_CODE"] => {
                self.config.validation.failed_code = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))?;
            }

            ["STORAGE", "BACKEND"] => {
                self.config.storage.backend = value
                    .parse()
                    .map_err(|reason: String| ConfigError::env_parse_error(key, reason))?;
            }
            ["STORAGE", "POSTGRES_URL"] => {
                self.config.storage.postgres_url = value.to_string();
            }
            ["STORAGE", "COCKROACH_URL"] => {
                self.config.storage.cockroach_url = value.to_string();
            }
            ["STORAGE", "DATABASE"] => {
                self.config.storage.database = value.to_string();
            }

            ["LOGGING", "LEVEL"] => {
                self.config.logging.level = value.to_string();
            }
            ["LOGGING", "FORMAT"] => {
                self.config.logging.format = match value.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    "compact" => LogFormat::Compact,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected 'json', 'pretty' or 'compact'",
                        ))
                    }
                };
            }

            // unknown keys are ignored
            _ => {}
        }

        Ok(())
    }
}
