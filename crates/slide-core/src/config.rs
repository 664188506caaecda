//! Process-wide application settings shared by every request context.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::validate::{RuleValidator, Validator};

/// Read-only settings handed to every [`Ctx`](crate::Ctx).
///
/// Built once at startup and shared behind an `Arc`; nothing reachable from
/// a context can mutate it.
#[derive(Clone, Default)]
pub struct AppConfig {
    validator: Option<Arc<dyn Validator>>,
    expose_internal_errors: bool,
    upload_dir: Option<PathBuf>,
    max_upload_bytes: Option<u64>,
}

impl AppConfig {
    /// Creates a configuration with no validator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the validator run by [`Ctx::bind`](crate::Ctx::bind).
    #[must_use]
    pub fn with_validator(mut self, validator: impl Validator) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Uses [`RuleValidator`], which applies each payload type's own rules.
    #[must_use]
    pub fn with_rule_validator(self) -> Self {
        self.with_validator(RuleValidator)
    }

    /// Includes internal error messages in error responses.
    #[must_use]
    pub fn with_expose_internal_errors(mut self, expose: bool) -> Self {
        self.expose_internal_errors = expose;
        self
    }

    /// Resolves relative [`Ctx::upload_file`](crate::Ctx::upload_file)
    /// destinations under `dir`.
    #[must_use]
    pub fn with_upload_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.upload_dir = Some(dir.into());
        self
    }

    /// Rejects uploaded files larger than `max` bytes.
    #[must_use]
    pub fn with_max_upload_bytes(mut self, max: Option<u64>) -> Self {
        self.max_upload_bytes = max;
        self
    }

    /// Returns the configured validator.
    #[must_use]
    pub fn validator(&self) -> Option<&dyn Validator> {
        self.validator.as_deref()
    }

    /// Returns true if internal error messages are shown to clients.
    #[must_use]
    pub fn expose_internal_errors(&self) -> bool {
        self.expose_internal_errors
    }

    /// Directory relative upload destinations are placed in.
    #[must_use]
    pub fn upload_dir(&self) -> Option<&Path> {
        self.upload_dir.as_deref()
    }

    /// Largest accepted uploaded file, if limited.
    #[must_use]
    pub fn max_upload_bytes(&self) -> Option<u64> {
        self.max_upload_bytes
    }

    /// Where an upload to `dest` is written.
    #[must_use]
    pub fn upload_path(&self, dest: &Path) -> PathBuf {
        match &self.upload_dir {
            Some(dir) if dest.is_relative() => dir.join(dest),
            _ => dest.to_path_buf(),
        }
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("validator", &self.validator.is_some())
            .field("expose_internal_errors", &self.expose_internal_errors)
            .field("upload_dir", &self.upload_dir)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish()
    }
}
