//! Request ID middleware.
//!
//! Assigns every request a unique [`RequestId`], used for:
//!
//! - Log correlation across services
//! - Error envelopes returned to clients
//! - Support ticket references
//!
//! ## Request ID Sources
//!
//! 1. **X-Request-ID header**: used when incoming IDs are trusted and the
//!    header holds a valid UUID
//! 2. **Generated UUID v7**: otherwise
//!
//! The ID is stored in the context's extensions for later entries and is
//! always echoed in the `X-Request-ID` response header.

use http::HeaderValue;
use slide_core::{BoxFuture, Ctx, Handler, RequestId, SlideResult};

/// The header name for request ID propagation.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Middleware that generates or extracts request IDs.
///
/// # Example
///
/// ```
/// use slide_middleware::RequestIdMiddleware;
///
/// // External traffic: always generate.
/// let public = RequestIdMiddleware::new();
///
/// // Internal service-to-service traffic: reuse the caller's ID.
/// let internal = RequestIdMiddleware::trust_incoming();
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestIdMiddleware {
    /// Whether to trust incoming request ID headers.
    ///
    /// Should typically be `false` for external traffic and `true` for
    /// internal service-to-service calls.
    trust_incoming: bool,
}

impl RequestIdMiddleware {
    /// Creates a middleware that always generates new IDs.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a middleware that trusts incoming `X-Request-ID` headers.
    #[must_use]
    pub fn trust_incoming() -> Self {
        Self {
            trust_incoming: true,
        }
    }

    /// Extracts the request ID from headers if trusted and valid.
    fn extract_request_id(&self, ctx: &Ctx) -> Option<RequestId> {
        if !self.trust_incoming {
            return None;
        }

        ctx.header(REQUEST_ID_HEADER)
            .and_then(|value| value.parse().ok())
    }
}

impl Handler for RequestIdMiddleware {
    fn call<'a>(&'a self, ctx: &'a mut Ctx) -> BoxFuture<'a, SlideResult<()>> {
        Box::pin(async move {
            let request_id = self
                .extract_request_id(ctx)
                .unwrap_or_else(RequestId::new);

            ctx.set_extension(request_id);

            let result = ctx.next().await;

            // A UUID always renders as a valid header value.
            if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
                ctx.set_header(REQUEST_ID_HEADER, value);
            }

            result
        })
    }

    fn name(&self) -> &'static str {
        "request_id"
    }
}

/// Returns the request ID assigned to `ctx`, if any.
#[must_use]
pub fn request_id(ctx: &Ctx) -> Option<RequestId> {
    ctx.extension::<RequestId>().copied()
}
