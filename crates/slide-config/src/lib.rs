//! Typed configuration for Slide applications.
//!
//! This crate provides a strongly-typed configuration with support for:
//! - TOML and JSON configuration files
//! - `.env` files
//! - Environment variable overrides
//! - Strict validation (fails on unknown fields)
//! - Layered configuration (defaults → file → `.env` → env)
//!
//! # Overview
//!
//! [`SlideConfig`] holds three sections:
//!
//! - [`ServerConfig`] - listener address, timeouts and body limits
//! - [`LoggingConfig`] - filter level and output format
//! - [`UploadsConfig`] - destination and size limit for uploaded files
//!
//! # Example
//!
//! ```no_run
//! use slide_config::ConfigLoader;
//!
//! # fn main() -> Result<(), slide_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_optional_file("slide.toml")?
//!     .with_dotenv()?
//!     .with_env_prefix("SLIDE")
//!     .load()?;
//!
//! println!("listening on {}", config.server.http_addr);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! http_addr = "0.0.0.0:8080"
//! shutdown_timeout_secs = 30
//! request_timeout_ms = 30000
//! max_body_bytes = 10485760
//! expose_internal_errors = false
//!
//! [logging]
//! enabled = true
//! level = "info"
//! format = "json"
//!
//! [uploads]
//! dir = "uploads"
//! max_file_bytes = 5242880
//! ```
//!
//! # Environment Variable Overrides
//!
//! Values can be overridden with variables named `PREFIX__SECTION__KEY`:
//!
//! - `SLIDE__SERVER__HTTP_ADDR=0.0.0.0:9000`
//! - `SLIDE__LOGGING__FORMAT=pretty`
//! - `SLIDE__UPLOADS__MAX_FILE_BYTES=none`

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::{SlideConfig, SlideConfigBuilder};
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{LogFormat, LoggingConfig, ServerConfig, UploadsConfig};
