//! Configuration loader with layered approach.
//!
//! This module provides the [`ConfigLoader`] for loading configuration from
//! multiple sources: defaults, files, `.env` files and environment variables.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::{ConfigError, LogFormat, SlideConfig};

/// Configuration loader with layered approach.
///
/// The loader applies configuration in layers, with later layers overriding
/// earlier ones:
/// 1. Default values (built into the code, or a preset)
/// 2. Configuration files (TOML or JSON), merged key by key
/// 3. `.env` files, which only populate the process environment
/// 4. Environment variables named `PREFIX__SECTION__KEY`
///
/// Validation runs once, in [`load`](Self::load).
///
/// # Example
///
/// ```no_run
/// use slide_config::ConfigLoader;
///
/// # fn main() -> Result<(), slide_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_defaults()
///     .with_file("slide.toml")?
///     .with_dotenv()?
///     .with_env_prefix("SLIDE")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: SlideConfig,
    env_prefix: Option<String>,
    sources: Vec<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader starting from defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: SlideConfig::default(),
            env_prefix: None,
            sources: Vec::new(),
        }
    }

    /// Start with default configuration values.
    ///
    /// This is what `new()` does, but can be chained for clarity.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = SlideConfig::default();
        self
    }

    /// Start with the development preset.
    ///
    /// # Example
    ///
    /// ```
    /// use slide_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_development()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = SlideConfig::development();
        self
    }

    /// Start with the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = SlideConfig::production();
        self
    }

    /// Merge a configuration file over the current values.
    ///
    /// The format is chosen by extension (`.toml` or `.json`). Keys the file
    /// does not mention keep their current values.
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

        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .ok_or_else(|| ConfigError::unsupported_format(path.display().to_string()))?;

        self = self.with_string(&content, &format)?;
        debug!(path = %path.display(), "configuration file merged");
        self.sources.push(path.to_path_buf());
        Ok(self)
    }

    /// Merge a configuration file if it exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be read or parsed.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Merge configuration text in the given format (`"toml"` or `"json"`).
    ///
    /// # Example
    ///
    /// ```
    /// use slide_config::ConfigLoader;
    ///
    /// let toml = r#"
    ///     [server]
    ///     http_addr = "127.0.0.1:3000"
    /// "#;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string(toml, "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.server.http_addr, "127.0.0.1:3000");
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        // Parse strictly first so unknown fields are reported in the
        // layer's own format, then merge the raw tree.
        let layer: Value = match format.to_lowercase().as_str() {
            "toml" => {
                toml::from_str::<SlideConfig>(content)?;
                toml::from_str(content)?
            }
            "json" => {
                serde_json::from_str::<SlideConfig>(content)?;
                serde_json::from_str(content)?
            }
            _ => return Err(ConfigError::unsupported_format(format)),
        };

        let mut merged = serde_json::to_value(&self.config)?;
        merge_values(&mut merged, layer);
        self.config = serde_json::from_value(merged)?;
        Ok(self)
    }

    /// Set environment variable prefix for overrides.
    ///
    /// Environment variables use the format `PREFIX__SECTION__KEY`, for
    /// example `SLIDE__SERVER__HTTP_ADDR=0.0.0.0:9000`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Load `.env` from the current directory or its parents, if present.
    ///
    /// Variables already set in the process environment are not replaced.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a `.env` file is found but is malformed.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => {
                debug!(path = %path.display(), "environment file loaded");
                Ok(self)
            }
            Err(err) if err.not_found() => Ok(self),
            Err(err) => Err(ConfigError::dotenv_error(".env", err.to_string())),
        }
    }

    /// Load a specific environment file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file is missing or malformed.
    pub fn with_dotenv_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        dotenvy::from_path(path).map_err(|err| ConfigError::dotenv_error(path, err.to_string()))?;
        debug!(path = %path.display(), "environment file loaded");
        Ok(self)
    }

    /// Files merged so far, in order.
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    /// Finalize and return the loaded configuration.
    ///
    /// Applies environment variable overrides (if a prefix was set) and
    /// validates the final configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an override cannot be parsed or validation
    /// fails.
    ///
    /// # Example
    ///
    /// ```
    /// use slide_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new().load().unwrap();
    /// assert_eq!(config.server.http_addr, "0.0.0.0:8080");
    /// ```
    pub fn load(mut self) -> Result<SlideConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_overrides(&prefix)?;
        }

        self.config.validate()?;
        Ok(self.config)
    }

    /// Finalize without environment overrides or validation.
    #[must_use]
    pub fn load_unvalidated(self) -> SlideConfig {
        self.config
    }

    fn apply_env_overrides(&mut self, prefix: &str) -> Result<(), ConfigError> {
        let marker = format!("{prefix}__");
        // Sorted so a failing variable is reported deterministically.
        let env_vars: BTreeMap<String, String> = env::vars()
            .filter(|(k, _)| k.starts_with(&marker))
            .collect();

        for (key, value) in env_vars {
            self.apply_env_var(&key, &value, prefix)?;
        }

        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let key_without_prefix = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
            .ok_or_else(|| ConfigError::env_parse_error(key, "invalid key format"))?;

        let parts: Vec<&str> = key_without_prefix.split("__").collect();
        let server = &mut self.config.server;
        let logging = &mut self.config.logging;
        let uploads = &mut self.config.uploads;

        match parts.as_slice() {
            ["SERVER", "HTTP_ADDR"] => server.http_addr = value.to_string(),
            ["SERVER", "SHUTDOWN_TIMEOUT_SECS"] => {
                server.shutdown_timeout_secs = parse_int(key, value)?;
            }
            ["SERVER", "REQUEST_TIMEOUT_MS"] => server.request_timeout_ms = parse_int(key, value)?,
            ["SERVER", "MAX_BODY_BYTES"] => server.max_body_bytes = parse_int(key, value)?,
            ["SERVER", "EXPOSE_INTERNAL_ERRORS"] => {
                server.expose_internal_errors = parse_flag(key, value)?;
            }

            ["LOGGING", "ENABLED"] => logging.enabled = parse_flag(key, value)?,
            ["LOGGING", "LEVEL"] => logging.level = value.to_string(),
            ["LOGGING", "FORMAT"] => {
                logging.format = match value.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected 'json' or 'pretty'",
                        ))
                    }
                };
            }
            ["LOGGING", "ANSI_ENABLED"] => logging.ansi_enabled = parse_flag(key, value)?,
            ["LOGGING", "INCLUDE_LOCATION"] => logging.include_location = parse_flag(key, value)?,

            ["UPLOADS", "DIR"] => uploads.dir = PathBuf::from(value),
            ["UPLOADS", "MAX_FILE_BYTES"] => {
                uploads.max_file_bytes = if value.is_empty() || value.eq_ignore_ascii_case("none") {
                    None
                } else {
                    Some(parse_int(key, value)?)
                };
            }

            _ => debug!(var = key, "ignoring unrecognized configuration variable"),
        }

        Ok(())
    }
}

/// Recursively overlays `layer` onto `base`; objects merge, other values replace.
fn merge_values(base: &mut Value, layer: Value) {
    match (base, layer) {
        (Value::Object(base), Value::Object(layer)) => {
            for (key, value) in layer {
                match base.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, layer) => *base = layer,
    }
}

fn parse_int(key: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    parse_bool(value).ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))
}

/// Parse a boolean from a string.
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loader_new() {
        let config = ConfigLoader::new().load().unwrap();
        assert_eq!(config.server.http_addr, "0.0.0.0:8080");
    }

    #[test]
    fn test_loader_with_production() {
        let config = ConfigLoader::new().with_production().load().unwrap();
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_loader_with_string_json() {
        let json = r#"{"server": {"http_addr": "127.0.0.1:3000"}}"#;

        let config = ConfigLoader::new()
            .with_string(json, "json")
            .unwrap()
            .load()
            .unwrap();

        assert_eq!(config.server.http_addr, "127.0.0.1:3000");
    }

    #[test]
    fn test_layer_keeps_preset_values_it_does_not_mention() {
        let config = ConfigLoader::new()
            .with_development()
            .with_string("[server]\nrequest_timeout_ms = 250", "toml")
            .unwrap()
            .load()
            .unwrap();

        assert_eq!(config.server.request_timeout_ms, 250);
        assert_eq!(config.server.http_addr, "127.0.0.1:8080");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_later_layers_override_earlier_ones() {
        let config = ConfigLoader::new()
            .with_string(r#"{"logging": {"level": "warn", "format": "pretty"}}"#, "json")
            .unwrap()
            .with_string("[logging]\nlevel = \"trace\"", "toml")
            .unwrap()
            .load()
            .unwrap();

        assert_eq!(config.logging.level, "trace");
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = ConfigLoader::new().with_string("[server]\nmax_connections = 10", "toml");
        assert!(matches!(result, Err(ConfigError::TomlError(_))));
    }

    #[test]
    fn test_unsupported_format() {
        let result = ConfigLoader::new().with_string("a: 1", "yaml");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat { .. })));
    }

    #[test]
    fn test_loader_with_file_not_found() {
        let result = ConfigLoader::new().with_file("/nonexistent/slide.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_loader_with_optional_file_not_found() {
        let loader = ConfigLoader::new()
            .with_optional_file("/nonexistent/slide.toml")
            .unwrap();
        assert!(loader.sources().is_empty());
        assert_eq!(loader.load().unwrap().server.http_addr, "0.0.0.0:8080");
    }

    #[test]
    fn test_load_validates() {
        let result = ConfigLoader::new()
            .with_string("[server]\nhttp_addr = \"not-an-addr\"", "toml")
            .unwrap()
            .load();
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("true"), Some(true));
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool("yes"), Some(true));
        assert_eq!(parse_bool("on"), Some(true));

        assert_eq!(parse_bool("false"), Some(false));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("off"), Some(false));

        assert_eq!(parse_bool("maybe"), None);
        assert_eq!(parse_bool(""), None);
    }

    #[test]
    fn test_apply_env_var_server() {
        let mut loader = ConfigLoader::new();
        loader
            .apply_env_var("TEST__SERVER__HTTP_ADDR", "192.168.1.1:9000", "TEST")
            .unwrap();
        loader
            .apply_env_var("TEST__SERVER__MAX_BODY_BYTES", "4096", "TEST")
            .unwrap();
        loader
            .apply_env_var("TEST__SERVER__EXPOSE_INTERNAL_ERRORS", "yes", "TEST")
            .unwrap();
        assert_eq!(loader.config.server.http_addr, "192.168.1.1:9000");
        assert_eq!(loader.config.server.max_body_bytes, 4096);
        assert!(loader.config.server.expose_internal_errors);
    }

    #[test]
    fn test_apply_env_var_logging_and_uploads() {
        let mut loader = ConfigLoader::new();
        loader
            .apply_env_var("TEST__LOGGING__FORMAT", "pretty", "TEST")
            .unwrap();
        loader
            .apply_env_var("TEST__UPLOADS__DIR", "/srv/uploads", "TEST")
            .unwrap();
        loader
            .apply_env_var("TEST__UPLOADS__MAX_FILE_BYTES", "1024", "TEST")
            .unwrap();
        assert_eq!(loader.config.logging.format, LogFormat::Pretty);
        assert_eq!(loader.config.uploads.dir, PathBuf::from("/srv/uploads"));
        assert_eq!(loader.config.uploads.max_file_bytes, Some(1024));

        loader
            .apply_env_var("TEST__UPLOADS__MAX_FILE_BYTES", "none", "TEST")
            .unwrap();
        assert_eq!(loader.config.uploads.max_file_bytes, None);
    }

    #[test]
    fn test_apply_env_var_invalid_values() {
        let mut loader = ConfigLoader::new();
        assert!(loader
            .apply_env_var("TEST__SERVER__REQUEST_TIMEOUT_MS", "soon", "TEST")
            .is_err());
        assert!(loader
            .apply_env_var("TEST__LOGGING__FORMAT", "xml", "TEST")
            .is_err());
        assert!(loader
            .apply_env_var("TEST__LOGGING__ENABLED", "maybe", "TEST")
            .is_err());
    }

    #[test]
    fn test_apply_env_var_unknown_key_ignored() {
        let mut loader = ConfigLoader::new();
        loader
            .apply_env_var("TEST__SERVER__UNKNOWN", "1", "TEST")
            .unwrap();
        assert_eq!(loader.config, SlideConfig::default());
    }

    #[test]
    fn test_merge_values_replaces_scalars_and_merges_objects() {
        let mut base = serde_json::json!({"a": {"b": 1, "c": 2}, "d": [1]});
        merge_values(&mut base, serde_json::json!({"a": {"c": 3}, "d": [2, 3]}));
        assert_eq!(base, serde_json::json!({"a": {"b": 1, "c": 3}, "d": [2, 3]}));
    }
}
