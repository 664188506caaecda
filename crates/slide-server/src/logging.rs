//! Process-wide `tracing` subscriber setup.
//!
//! Output is JSON for production and a multi-line pretty format for local
//! work, both filtered by an `EnvFilter` built from
//! [`LoggingConfig::level`](slide_config::LoggingConfig::level).
//!
//! ```rust,no_run
//! use slide_config::SlideConfig;
//! use slide_server::logging::init_logging;
//!
//! let config = SlideConfig::development();
//! init_logging(&config.logging).unwrap();
//! tracing::info!(addr = %config.server.http_addr, "starting");
//! ```

use slide_config::{LogFormat, LoggingConfig};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::error::{ServerError, ServerResult};

/// Installs the global subscriber described by `config`.
///
/// Does nothing when logging is disabled.
///
/// # Errors
///
/// Returns `ServerError::Logging` if the level is not a valid filter or a
/// global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> ServerResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = create_env_filter(&config.level)?;

    match config.format {
        LogFormat::Json => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_file(config.include_location)
                .with_line_number(config.include_location)
                .with_filter(filter);

            tracing_subscriber::registry()
                .with(fmt_layer)
                .try_init()
                .map_err(|e| ServerError::Logging(e.to_string()))
        }
        LogFormat::Pretty => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .pretty()
                .with_ansi(config.ansi_enabled)
                .with_file(config.include_location)
                .with_line_number(config.include_location)
                .with_filter(filter);

            tracing_subscriber::registry()
                .with(fmt_layer)
                .try_init()
                .map_err(|e| ServerError::Logging(e.to_string()))
        }
    }
}

/// Parses a filter such as `info` or `slide_core=debug,warn`.
///
/// # Errors
///
/// Returns `ServerError::Logging` if the directive is malformed.
pub fn create_env_filter(directive: &str) -> ServerResult<EnvFilter> {
    EnvFilter::try_new(directive)
        .map_err(|e| ServerError::Logging(format!("invalid log level '{directive}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directives() {
        assert!(create_env_filter("info").is_ok());
        assert!(create_env_filter("slide_core=debug,warn").is_ok());
        assert!(create_env_filter("slide_core=loud").is_err());
    }

    #[test]
    fn test_disabled_logging_is_noop() {
        let config = LoggingConfig {
            enabled: false,
            level: "not a level ===".to_string(),
            ..LoggingConfig::default()
        };
        assert!(init_logging(&config).is_ok());
    }

    #[test]
    fn test_invalid_level_is_reported() {
        let config = LoggingConfig {
            level: "slide_core=loud".to_string(),
            ..LoggingConfig::default()
        };
        assert!(matches!(init_logging(&config), Err(ServerError::Logging(_))));
    }
}
