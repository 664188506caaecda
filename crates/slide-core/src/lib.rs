//! # Slide Core
//!
//! Request context and middleware chain for the Slide web framework.
//!
//! This crate provides the types every handler and middleware works with:
//!
//! - [`Ctx`] - Per-request context: parameters, query, payload binding and
//!   response writing, plus the [`Ctx::next`] continuation
//! - [`Chain`] - A route's ordered chain of middleware and handler
//! - [`Handler`] - The shape of a chain entry
//! - [`Exchange`] - The request and the response being built for it
//! - [`SlideError`] - Standard error type
//! - [`Codec`] / [`Validator`] - Seams for payload formats and validation

#![doc(html_root_url = "https://docs.rs/slide-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod chain;
mod codec;
mod config;
pub mod content_type;
mod context;
mod error;
mod exchange;
mod handler;
pub mod query;
mod request_id;
mod validate;

pub use chain::{Chain, ChainState};
pub use codec::{Codec, Form, Json};
pub use config::AppConfig;
pub use context::Ctx;
pub use error::{ErrorDetail, ErrorEnvelope, SlideError, SlideResult, ValidationError};
pub use exchange::{Exchange, FormFile, ResponseBody};
pub use handler::{boxed, handler_fn, BoxFuture, BoxedHandler, Handler};
pub use request_id::RequestId;
pub use validate::{RuleValidator, Validate, Validator};

pub use slide_router::{Params, RoutePattern};

pub use http;
