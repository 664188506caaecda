//! Error normalization middleware.
//!
//! Converts an error returned by the rest of the chain into a standard
//! JSON error response, so clients see one envelope format no matter which
//! entry failed.
//!
//! # Error Envelope Format
//!
//! ```json
//! {
//!   "error": {
//!     "code": "ERROR_CODE",
//!     "message": "Human-readable error message",
//!     "request_id": "uuid-v7-request-id"
//!   }
//! }
//! ```
//!
//! Messages of server-side errors are replaced by the status reason unless
//! internal errors are exposed, either on the middleware or through
//! [`AppConfig`](slide_core::AppConfig).
//!
//! # Example
//!
//! ```
//! use slide_middleware::ErrorNormalizationMiddleware;
//!
//! // Default configuration
//! let error_norm = ErrorNormalizationMiddleware::new();
//!
//! // With verbose internal errors (development only)
//! let error_norm = ErrorNormalizationMiddleware::new().expose_internal_errors(true);
//! ```

use http::HeaderValue;
use slide_core::{BoxFuture, Ctx, Handler, SlideError, SlideResult};
use tracing::error;

use crate::stages::request_id::{request_id, REQUEST_ID_HEADER};

/// Error normalization middleware that ensures consistent error responses.
#[derive(Debug, Clone, Default)]
pub struct ErrorNormalizationMiddleware {
    /// Whether to expose internal error details (development mode).
    expose_internal_errors: bool,
}

impl ErrorNormalizationMiddleware {
    /// Creates a new error normalization middleware with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether internal error messages reach clients.
    #[must_use]
    pub fn expose_internal_errors(mut self, expose: bool) -> Self {
        self.expose_internal_errors = expose;
        self
    }
}

/// Replaces the response in `ctx` with the JSON envelope for `err`.
///
/// Anything already written (status, headers, body) is discarded, except
/// that an assigned request id is echoed again in `x-request-id`.
pub fn write_error(ctx: &mut Ctx, err: &SlideError, expose_internal: bool) -> SlideResult<()> {
    let request_id = request_id(ctx).map(|id| id.to_string());
    let envelope = err.to_envelope(request_id.as_deref(), expose_internal);

    ctx.exchange_mut().reset_response();
    if let Some(value) = request_id.and_then(|id| HeaderValue::from_str(&id).ok()) {
        ctx.set_header(REQUEST_ID_HEADER, value);
    }
    ctx.json(err.status_code(), &envelope)
}

impl Handler for ErrorNormalizationMiddleware {
    fn call<'a>(&'a self, ctx: &'a mut Ctx) -> BoxFuture<'a, SlideResult<()>> {
        Box::pin(async move {
            let Err(err) = ctx.next().await else {
                return Ok(());
            };

            if err.status_code().is_server_error() {
                error!(error = %err, code = err.code(), path = %ctx.path(), "unhandled error");
            }

            let expose = self.expose_internal_errors || ctx.config().expose_internal_errors();
            write_error(ctx, &err, expose)
        })
    }

    fn name(&self) -> &'static str {
        "error_normalization"
    }
}
