//! Handler trait for chain entries.
//!
//! Middleware and route handlers share one shape: an async function over the
//! request context. Middleware continue the chain with
//! [`Ctx::next`](crate::Ctx::next); route handlers are simply the last entry.
//!
//! # Example
//!
//! ```
//! use slide_core::{BoxFuture, Ctx, SlideResult};
//! use http::StatusCode;
//!
//! fn hello(ctx: &mut Ctx) -> BoxFuture<'_, SlideResult<()>> {
//!     Box::pin(async move {
//!         let name = ctx.param("name").to_string();
//!         ctx.send(StatusCode::OK, format!("hello {name}"))
//!     })
//! }
//!
//! fn timing(ctx: &mut Ctx) -> BoxFuture<'_, SlideResult<()>> {
//!     Box::pin(async move {
//!         let started = std::time::Instant::now();
//!         let result = ctx.next().await;
//!         tracing::debug!(elapsed = ?started.elapsed(), "chain finished");
//!         result
//!     })
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::context::Ctx;
use crate::error::SlideResult;

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A type-erased, shareable chain entry.
pub type BoxedHandler = Arc<dyn Handler>;

/// One entry of a route chain: a middleware or the terminal route handler.
///
/// Implemented for every `Fn(&mut Ctx) -> BoxFuture<'_, SlideResult<()>>`,
/// so plain functions can be registered directly. Stateful middleware
/// implement it on a struct.
pub trait Handler: Send + Sync + 'static {
    /// Runs this entry.
    fn call<'a>(&'a self, ctx: &'a mut Ctx) -> BoxFuture<'a, SlideResult<()>>;

    /// Name used in logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

impl<F> Handler for F
where
    F: for<'a> Fn(&'a mut Ctx) -> BoxFuture<'a, SlideResult<()>> + Send + Sync + 'static,
{
    fn call<'a>(&'a self, ctx: &'a mut Ctx) -> BoxFuture<'a, SlideResult<()>> {
        self(ctx)
    }
}

/// Pins down the signature of a closure handler.
///
/// Closures passed straight to a registration method sometimes fail to infer
/// the higher-ranked lifetime; wrapping them here fixes the signature.
///
/// ```
/// use slide_core::handler_fn;
/// use http::StatusCode;
///
/// let ok = handler_fn(|ctx| Box::pin(async move { ctx.send_status(StatusCode::NO_CONTENT) }));
/// ```
pub fn handler_fn<F>(f: F) -> F
where
    F: for<'a> Fn(&'a mut Ctx) -> BoxFuture<'a, SlideResult<()>> + Send + Sync + 'static,
{
    f
}

/// Erases a handler into a [`BoxedHandler`].
pub fn boxed(handler: impl Handler) -> BoxedHandler {
    Arc::new(handler)
}
