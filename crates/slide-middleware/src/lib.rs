//! # Slide Middleware
//!
//! Built-in middleware for the Slide web framework.
//!
//! Middleware in Slide are ordinary chain entries: they receive the request
//! context, may write to the response, and decide whether the request goes
//! on by awaiting [`Ctx::next`](slide_core::Ctx::next). Returning without
//! calling it ends the request with the response written so far.
//!
//! ## Stages
//!
//! | Middleware | Purpose |
//! |------------|---------|
//! | [`RequestIdMiddleware`] | Generate/propagate request ID (UUID v7) |
//! | [`AccessLogMiddleware`] | Request span, status and latency logging |
//! | [`ErrorNormalizationMiddleware`] | Convert errors to the standard envelope |
//!
//! ## Example
//!
//! ```
//! use slide_core::{boxed, BoxedHandler};
//! use slide_middleware::{
//!     AccessLogMiddleware, ErrorNormalizationMiddleware, RequestIdMiddleware,
//! };
//!
//! let app_middleware: Vec<BoxedHandler> = vec![
//!     boxed(RequestIdMiddleware::new()),
//!     boxed(AccessLogMiddleware::new()),
//!     boxed(ErrorNormalizationMiddleware::new()),
//! ];
//! assert_eq!(app_middleware[0].name(), "request_id");
//! ```

#![doc(html_root_url = "https://docs.rs/slide-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod stages;

pub use stages::error_normalization::write_error;
pub use stages::request_id::{request_id, REQUEST_ID_HEADER};
pub use stages::{AccessLogMiddleware, ErrorNormalizationMiddleware, RequestIdMiddleware};
