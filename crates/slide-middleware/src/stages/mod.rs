//! Built-in middleware stages.
//!
//! Each stage is a [`Handler`](slide_core::Handler) that continues the chain
//! with [`Ctx::next`](slide_core::Ctx::next). A typical application chain is:
//!
//! 1. [`request_id`] - Generate/propagate request ID
//! 2. [`access_log`] - Request span and completion log
//! 3. [`error_normalization`] - Error envelope conversion

pub mod access_log;
pub mod error_normalization;
pub mod request_id;

// Re-export main types
pub use access_log::AccessLogMiddleware;
pub use error_normalization::ErrorNormalizationMiddleware;
pub use request_id::RequestIdMiddleware;
