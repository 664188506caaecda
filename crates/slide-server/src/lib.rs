//! # Slide Server
//!
//! Application assembly and HTTP serving for the Slide web framework.
//!
//! - [`Slide`] / [`Group`]: register application middleware, route groups
//!   and routes, then [`build`](Slide::build) an immutable [`App`]
//! - [`App::handle`]: route one `http::Request<Bytes>` through its chain,
//!   answering 404/405 for unmatched requests
//! - [`Server`]: HTTP/1.1 over hyper with body limits, request timeouts and
//!   graceful shutdown
//! - [`logging::init_logging`]: `tracing-subscriber` setup from
//!   [`LoggingConfig`](slide_config::LoggingConfig)
//!
//! ## Example
//!
//! ```rust,no_run
//! use http::StatusCode;
//! use slide_config::SlideConfig;
//! use slide_core::{BoxFuture, Ctx, SlideResult};
//! use slide_middleware::{AccessLogMiddleware, ErrorNormalizationMiddleware, RequestIdMiddleware};
//! use slide_server::{logging, Server, Slide};
//!
//! fn hello(ctx: &mut Ctx) -> BoxFuture<'_, SlideResult<()>> {
//!     Box::pin(async move { ctx.send(StatusCode::OK, "hello") })
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), slide_server::ServerError> {
//!     let config = SlideConfig::development();
//!     logging::init_logging(&config.logging)?;
//!
//!     let mut slide = Slide::from_config(&config);
//!     slide
//!         .use_middleware(RequestIdMiddleware::new())
//!         .use_middleware(AccessLogMiddleware::new())
//!         .use_middleware(ErrorNormalizationMiddleware::new())
//!         .get("/hello", hello);
//!
//!     Server::new(slide.build(), config.server).run().await
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/slide-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod app;
pub mod body;
mod error;
pub mod logging;
mod server;
mod shutdown;

pub use app::{app_config, App, Group, Slide};
pub use body::SlideBody;
pub use error::{ServerError, ServerResult};
pub use server::Server;
pub use shutdown::{ConnectionToken, ConnectionTracker, ShutdownSignal};
