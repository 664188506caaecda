//! Main configuration types.
//!
//! This module provides the top-level [`SlideConfig`] struct and its builder.

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, LogFormat, LoggingConfig, ServerConfig, UploadsConfig};

/// Complete Slide application configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// # Example
///
/// ```
/// use slide_config::SlideConfig;
///
/// let config = SlideConfig::default();
/// assert_eq!(config.server.http_addr, "0.0.0.0:8080");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct SlideConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Upload configuration.
    #[serde(default)]
    pub uploads: UploadsConfig,
}

impl SlideConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> SlideConfigBuilder {
        SlideConfigBuilder::new()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - The server address is not a socket address
    /// - A timeout or size limit is zero
    /// - The log level is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.socket_addr()?;

        if self.server.request_timeout_ms == 0 {
            return Err(ConfigError::invalid_value(
                "server.request_timeout_ms",
                "must be greater than zero",
            ));
        }

        if self.server.max_body_bytes == 0 {
            return Err(ConfigError::invalid_value(
                "server.max_body_bytes",
                "must be greater than zero",
            ));
        }

        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::invalid_value("logging.level", "must not be empty"));
        }

        if self.uploads.max_file_bytes == Some(0) {
            return Err(ConfigError::invalid_value(
                "uploads.max_file_bytes",
                "must be greater than zero when set",
            ));
        }

        Ok(())
    }

    /// Parses `server.http_addr`.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server.http_addr.parse().map_err(|_| {
            ConfigError::invalid_value(
                "server.http_addr",
                format!("invalid socket address: {}", self.server.http_addr),
            )
        })
    }

    /// Create a development configuration preset.
    ///
    /// Pretty, colored debug logs on localhost with server error messages
    /// exposed in responses.
    ///
    /// # Example
    ///
    /// ```
    /// use slide_config::{LogFormat, SlideConfig};
    ///
    /// let config = SlideConfig::development();
    /// assert_eq!(config.logging.format, LogFormat::Pretty);
    /// assert!(config.server.expose_internal_errors);
    /// ```
    #[must_use]
    pub fn development() -> Self {
        Self {
            server: ServerConfig {
                http_addr: "127.0.0.1:8080".to_string(),
                expose_internal_errors: true,
                ..ServerConfig::default()
            },
            logging: LoggingConfig {
                level: "debug".to_string(),
                format: LogFormat::Pretty,
                ansi_enabled: true,
                include_location: true,
                ..LoggingConfig::default()
            },
            uploads: UploadsConfig::default(),
        }
    }

    /// Create a production configuration preset.
    ///
    /// JSON logs at `info` and internal error messages hidden.
    #[must_use]
    pub fn production() -> Self {
        Self {
            server: ServerConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                format: LogFormat::Json,
                ..LoggingConfig::default()
            },
            uploads: UploadsConfig::default(),
        }
    }
}

/// Builder for [`SlideConfig`].
#[derive(Debug, Default)]
pub struct SlideConfigBuilder {
    config: SlideConfig,
}

impl SlideConfigBuilder {
    /// Create a builder starting from defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the server section.
    #[must_use]
    pub fn server(mut self, server: ServerConfig) -> Self {
        self.config.server = server;
        self
    }

    /// Set the logging section.
    #[must_use]
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.config.logging = logging;
        self
    }

    /// Set the uploads section.
    #[must_use]
    pub fn uploads(mut self, uploads: UploadsConfig) -> Self {
        self.config.uploads = uploads;
        self
    }

    /// Build without validation.
    #[must_use]
    pub fn build(self) -> SlideConfig {
        self.config
    }

    /// Build and validate.
    pub fn build_validated(self) -> Result<SlideConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
