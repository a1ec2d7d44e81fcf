//! Top-level [`HarnessConfig`] and its builder.

use serde::{Deserialize, Serialize};

use crate::{
    ConfigError, LogFormat, LoggingConfig, RequestConfig, StorageConfig, ValidationConfig,
};

/// Complete harness configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to layer files and environment
/// variables over the defaults.
///
/// # Example
///
/// ```
/// use gauntlet_config::HarnessConfig;
///
/// let config = HarnessConfig::default();
/// assert_eq!(config.validation.status, 400);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct HarnessConfig {
    /// Synthetic request defaults.
    #[serde(default)]
    pub request: RequestConfig,

    /// Validation failure wire shape.
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Storage backend selection.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Test logging.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl HarnessConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> HarnessConfigBuilder {
        HarnessConfigBuilder::new()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - The request host or project header is empty
    /// - The validation status is not a 4xx status
    /// - The storage database name is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request.host.trim().is_empty() {
            return Err(ConfigError::invalid_value("request.host", "must not be empty"));
        }

        if http::HeaderName::from_bytes(self.request.project_header.as_bytes()).is_err() {
            return Err(ConfigError::invalid_value(
                "request.project_header",
                format!("invalid header name: {:?}", self.request.project_header),
            ));
        }

        if !(400..500).contains(&self.validation.status) {
            return Err(ConfigError::invalid_value(
                "validation.status",
                format!("expected a 4xx status, got {}", self.validation.status),
            ));
        }

        if self.storage.database.is_empty() {
            return Err(ConfigError::invalid_value(
                "storage.database",
                "must not be empty",
            ));
        }

        Ok(())
    }

    /// Preset for debugging a failing suite: debug logs, pretty output.
    #[must_use]
    pub fn verbose() -> Self {
        let mut config = Self::default();
        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config
    }
}

/// Builder for [`HarnessConfig`].
#[derive(Debug, Default)]
pub struct HarnessConfigBuilder {
    request: Option<RequestConfig>,
    validation: Option<ValidationConfig>,
    storage: Option<StorageConfig>,
    logging: Option<LoggingConfig>,
}

impl HarnessConfigBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the request defaults.
    #[must_use]
    pub fn request(mut self, request: RequestConfig) -> Self {
        self.request = Some(request);
        self
    }

    /// Set the validation failure shape.
    #[must_use]
    pub fn validation(mut self, validation: ValidationConfig) -> Self {
        self.validation = Some(validation);
        self
    }

    /// Set the storage configuration.
    #[must_use]
    pub fn storage(mut self, storage: StorageConfig) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Set the logging configuration.
    #[must_use]
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Build the configuration. Unset sections use their defaults.
    #[must_use]
    pub fn build(self) -> HarnessConfig {
        HarnessConfig {
            request: self.request.unwrap_or_default(),
            validation: self.validation.unwrap_or_default(),
            storage: self.storage.unwrap_or_default(),
            logging: self.logging.unwrap_or_default(),
        }
    }

    /// Build and validate the configuration.
    pub fn build_validated(self) -> Result<HarnessConfig, ConfigError> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default() {
        assert!(HarnessConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_empty_host() {
        let config = HarnessConfig::builder()
            .request(RequestConfig {
                host: "  ".to_string(),
                ..Default::default()
            })
            .build();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("request.host"));
    }

    #[test]
    fn test_validate_bad_project_header() {
        let result = HarnessConfig::builder()
            .request(RequestConfig {
                project_header: "Bad Header".to_string(),
                ..Default::default()
            })
            .build_validated();
        assert!(result.unwrap_err().to_string().contains("project_header"));
    }

    #[test]
    fn test_validate_non_client_error_status() {
        let result = HarnessConfig::builder()
            .validation(ValidationConfig {
                status: 200,
                failed_code: 2004,
            })
            .build_validated();
        assert!(result.unwrap_err().to_string().contains("validation.status"));
    }

    #[test]
    fn test_validate_empty_database() {
        let result = HarnessConfig::builder()
            .storage(StorageConfig {
                database: String::new(),
                ..Default::default()
            })
            .build_validated();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_all_sections() {
        let config = HarnessConfig::builder()
            .validation(ValidationConfig {
                status: 422,
                failed_code: 9000,
            })
            .storage(StorageConfig {
                backend: crate::StorageBackend::Postgres,
                ..Default::default()
            })
            .logging(LoggingConfig {
                level: "trace".to_string(),
                format: LogFormat::Json,
            })
            .build_validated()
            .unwrap();

        assert_eq!(config.validation.status, 422);
        assert_eq!(config.storage.backend, crate::StorageBackend::Postgres);
        assert_eq!(config.logging.level, "trace");
        assert_eq!(config.request, RequestConfig::default());
    }

    #[test]
    fn test_verbose_preset() {
        let config = HarnessConfig::verbose();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }
}
