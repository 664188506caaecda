//! Access logging middleware.
//!
//! Wraps the rest of the chain in a `tracing` span carrying the method,
//! path, matched route and request ID, and emits one completion event per
//! request with the final status and latency. The request ID is recorded
//! once the chain returns, so it is captured whether the request ID
//! middleware runs before or after this one.
//!
//! ```text
//! INFO request{method=GET path=/users/7 route=/users/:id request_id=...}:
//!      request completed status=200 latency_ms=3
//! ```

use std::time::Instant;

use slide_core::{BoxFuture, Ctx, Handler, SlideResult};
use tracing::{info, warn, Instrument, Span};

use crate::stages::request_id::request_id;

/// Emits a span and a completion event per request.
#[derive(Debug, Clone)]
pub struct AccessLogMiddleware {
    /// Whether to log successful requests at all.
    ///
    /// Failures and server errors are always logged.
    log_success: bool,
}

impl Default for AccessLogMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl AccessLogMiddleware {
    /// Creates an access logger that logs every request.
    #[must_use]
    pub fn new() -> Self {
        Self { log_success: true }
    }

    /// Only logs failed requests and 5xx responses.
    #[must_use]
    pub fn errors_only() -> Self {
        Self { log_success: false }
    }

    /// Returns true if successful requests are logged.
    #[must_use]
    pub fn logs_success(&self) -> bool {
        self.log_success
    }
}

impl Handler for AccessLogMiddleware {
    fn call<'a>(&'a self, ctx: &'a mut Ctx) -> BoxFuture<'a, SlideResult<()>> {
        let span = tracing::info_span!(
            "request",
            method = %ctx.method(),
            path = %ctx.path(),
            route = %ctx.pattern(),
            request_id = tracing::field::Empty,
        );

        Box::pin(
            async move {
                let started = Instant::now();
                let result = ctx.next().await;

                // Set by the request ID middleware, which may run after this one.
                if let Some(id) = request_id(ctx) {
                    Span::current().record("request_id", tracing::field::display(id));
                }
                let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

                match &result {
                    Err(err) => warn!(
                        status = err.status_code().as_u16(),
                        error_code = err.code(),
                        latency_ms,
                        "request failed: {err}"
                    ),
                    Ok(()) if ctx.status().is_server_error() => warn!(
                        status = ctx.status().as_u16(),
                        latency_ms,
                        "request completed with server error"
                    ),
                    Ok(()) if self.log_success => info!(
                        status = ctx.status().as_u16(),
                        latency_ms,
                        "request completed"
                    ),
                    Ok(()) => {}
                }

                result
            }
            .instrument(span),
        )
    }

    fn name(&self) -> &'static str {
        "access_log"
    }
}
