//! # Slide
//!
//! A small async HTTP framework built around a mutable request context and
//! an explicit middleware chain.
//!
//! - **Routing**: `:name` path patterns, static segments before parameters
//! - **Context**: one [`Ctx`](prelude::Ctx) per request for params, query,
//!   body binding, uploads and response writing
//! - **Middleware**: application and group middleware continue the chain
//!   with `ctx.next().await`, or stop it by returning
//! - **Serving**: hyper HTTP/1.1 with body limits, timeouts and graceful
//!   shutdown, configured from TOML/JSON files and the environment
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use slide::prelude::*;
//!
//! fn show_user(ctx: &mut Ctx) -> BoxFuture<'_, SlideResult<()>> {
//!     Box::pin(async move {
//!         let id = ctx.param("id").to_string();
//!         let fields = ctx.query_param("fields").to_string();
//!         ctx.json(StatusCode::OK, &serde_json::json!({ "id": id, "fields": fields }))
//!     })
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ServerError> {
//!     let config = ConfigLoader::new()
//!         .with_optional_file("slide.toml")?
//!         .with_dotenv()?
//!         .with_env_prefix("SLIDE")
//!         .load()?;
//!     slide::server::logging::init_logging(&config.logging)?;
//!
//!     let mut app = Slide::from_config(&config);
//!     app.use_middleware(RequestIdMiddleware::new())
//!         .use_middleware(AccessLogMiddleware::new())
//!         .use_middleware(ErrorNormalizationMiddleware::new());
//!     app.group("/api").get("/users/:id", show_user);
//!
//!     Server::new(app.build(), config.server).run().await
//! }
//! ```
//!
//! ## Chain Order
//!
//! ```text
//! app middleware[0] → … → app middleware[n] → group middleware → handler
//! ```
//!
//! Each entry runs at most once per request. Code after `ctx.next().await`
//! runs on the way back out.

#![doc(html_root_url = "https://docs.rs/slide/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use slide_core as core;

// Re-export server types
pub use slide_server as server;

// Re-export middleware types
pub use slide_middleware as middleware;

// Re-export router types
pub use slide_router as router;

// Re-export configuration types
pub use slide_config as config;

/// Prelude module for convenient imports.
///
/// ```rust
/// use slide::prelude::*;
///
/// let app = Slide::new().build();
/// assert_eq!(app.route_count(), 0);
/// ```
pub mod prelude {
    pub use slide_core::{
        boxed, handler_fn, AppConfig, BoxFuture, BoxedHandler, ChainState, Ctx, FormFile, Handler,
        RequestId, SlideError, SlideResult, Validate, ValidationError,
    };

    pub use slide_middleware::{
        request_id, AccessLogMiddleware, ErrorNormalizationMiddleware, RequestIdMiddleware,
    };

    pub use slide_server::{App, Group, Server, ServerError, ShutdownSignal, Slide};

    pub use slide_config::{ConfigLoader, SlideConfig};

    pub use slide_core::http::StatusCode;
}
