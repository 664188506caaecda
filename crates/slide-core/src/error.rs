//! Error types for Slide.
//!
//! [`SlideError`] is returned by every fallible context operation and by
//! middleware and handlers. Each variant maps to an HTTP status code via
//! [`SlideError::status_code`] and to a stable machine-readable code via
//! [`SlideError::code`], which the error envelope exposes to clients.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using [`SlideError`].
pub type SlideResult<T> = Result<T, SlideError>;

/// Standard error type for Slide.
///
/// Serialization failures ([`Encode`](Self::Encode), [`Decode`](Self::Decode))
/// are kept apart from [`Validation`](Self::Validation) failures so that
/// handlers can branch on them.
///
/// # Example
///
/// ```
/// use slide_core::{SlideError, SlideResult};
///
/// fn require(name: &str) -> SlideResult<()> {
///     if name.is_empty() {
///         return Err(SlideError::internal("name must not be empty"));
///     }
///     Ok(())
/// }
///
/// assert!(require("").is_err());
/// ```
#[derive(Error, Debug)]
pub enum SlideError {
    /// A response payload could not be encoded.
    #[error("Encode error: {0}")]
    Encode(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A request payload could not be decoded.
    #[error("Decode error: {0}")]
    Decode(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A file could not be opened, read or written.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// The file involved.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A multipart form file could not be read.
    #[error("Form file '{field}' unavailable: {reason}")]
    FormFile {
        /// The form field name.
        field: String,
        /// Why the field could not be read.
        reason: String,
    },

    /// No content type could be derived for a file.
    #[error("Cannot determine content type of {}: {reason}", path.display())]
    ContentType {
        /// The file involved.
        path: PathBuf,
        /// Why inference failed.
        reason: String,
    },

    /// A decoded payload was rejected by the configured validator.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The continuation was invoked more than once by the same chain entry,
    /// or by the terminal handler.
    #[error("Continuation misuse at chain entry {index}")]
    ContinuationMisuse {
        /// Position of the offending entry in the route chain.
        index: usize,
    },

    /// Handler-defined failure.
    #[error("Internal error: {message}")]
    Internal {
        /// Human-readable error message.
        message: String,
        /// The underlying error (not exposed to clients).
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl SlideError {
    /// Creates an encode error.
    pub fn encode(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Encode(err.into())
    }

    /// Creates a decode error.
    pub fn decode(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Decode(err.into())
    }

    /// Creates an I/O error for `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a form file error.
    pub fn form_file(field: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::FormFile {
            field: field.into(),
            reason: reason.to_string(),
        }
    }

    /// Creates a content type inference error.
    pub fn content_type(path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        Self::ContentType {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an internal error with a source error.
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Decode(_) | Self::FormFile { .. } => StatusCode::BAD_REQUEST,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
                StatusCode::NOT_FOUND
            }
            Self::Encode(_)
            | Self::Io { .. }
            | Self::ContentType { .. }
            | Self::ContinuationMisuse { .. }
            | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Encode(_) => "ENCODE_ERROR",
            Self::Decode(_) => "DECODE_ERROR",
            Self::Io { .. } => "IO_ERROR",
            Self::FormFile { .. } => "FORM_FILE_ERROR",
            Self::ContentType { .. } => "CONTENT_TYPE_ERROR",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::ContinuationMisuse { .. } => "CONTINUATION_MISUSE",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// Returns true if the message is safe to show to clients.
    ///
    /// File errors carry server paths and are never client facing, even when
    /// they map to a 4xx status.
    #[must_use]
    pub fn is_client_facing(&self) -> bool {
        !matches!(self, Self::Io { .. }) && self.status_code().is_client_error()
    }

    /// Converts this error into a serializable envelope.
    ///
    /// Server-side messages are replaced with the status reason unless
    /// `expose_internal` is set.
    #[must_use]
    pub fn to_envelope(&self, request_id: Option<&str>, expose_internal: bool) -> ErrorEnvelope {
        let message = if expose_internal || self.is_client_facing() {
            self.to_string()
        } else {
            self.status_code()
                .canonical_reason()
                .unwrap_or("Internal Server Error")
                .to_string()
        };

        let details = match self {
            Self::Validation(err) if !err.fields.is_empty() => {
                serde_json::to_value(&err.fields).ok()
            }
            _ => None,
        };

        ErrorEnvelope {
            error: ErrorDetail {
                code: self.code().to_string(),
                message,
                request_id: request_id.map(ToString::to_string),
                details,
            },
        }
    }
}

/// A validator's rejection of a decoded payload.
///
/// Carries an overall message plus optional per-field messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Human-readable summary.
    pub message: String,
    /// Map of field path to list of error messages.
    pub fields: BTreeMap<String, Vec<String>>,
}

impl ValidationError {
    /// Creates a validation error with a message and no field errors.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Adds an error for a field.
    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>, message: impl Into<String>) -> Self {
        self.add(field, message);
        self
    }

    /// Adds an error for a field.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    /// Returns `true` if there are no field errors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        for (field, messages) in &self.fields {
            write!(f, "; {field}: {}", messages.join(", "))?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Serializable error envelope for HTTP responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// The error details.
    pub error: ErrorDetail,
}

/// Error detail within an envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// The request ID for correlation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Per-field validation messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}
