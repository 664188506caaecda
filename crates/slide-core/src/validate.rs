//! Payload validation.
//!
//! Types opt in to validation by implementing [`Validate`]. A [`Validator`]
//! configured on [`AppConfig`](crate::AppConfig) decides how decoded payloads
//! are checked by [`Ctx::bind`](crate::Ctx::bind). Without a configured
//! validator, payloads are only decoded.
//!
//! # Example
//!
//! ```
//! use slide_core::{Validate, ValidationError};
//!
//! struct Signup {
//!     email: String,
//! }
//!
//! impl Validate for Signup {
//!     fn validate(&self) -> Result<(), ValidationError> {
//!         if self.email.contains('@') {
//!             Ok(())
//!         } else {
//!             Err(ValidationError::new("invalid signup").with_field("email", "must contain @"))
//!         }
//!     }
//! }
//! ```

use crate::error::ValidationError;

/// Structural rules a payload type checks about itself.
///
/// The default implementation accepts everything, so types without rules
/// can implement this with an empty `impl` block.
pub trait Validate {
    /// Checks the value.
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

/// Process-wide validation policy.
///
/// Object safe, so one instance can be shared behind `Arc<dyn Validator>`.
pub trait Validator: Send + Sync + 'static {
    /// Checks a decoded payload.
    fn validate(&self, target: &dyn Validate) -> Result<(), ValidationError>;
}

/// Validator that applies each type's own [`Validate`] rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleValidator;

impl Validator for RuleValidator {
    fn validate(&self, target: &dyn Validate) -> Result<(), ValidationError> {
        target.validate()
    }
}

macro_rules! accept_all {
    ($($ty:ty),* $(,)?) => {
        $(impl Validate for $ty {})*
    };
}

accept_all!(
    (),
    bool,
    String,
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    u64,
    f32,
    f64,
    serde_json::Value,
);

impl<T: Validate> Validate for Vec<T> {
    fn validate(&self) -> Result<(), ValidationError> {
        self.iter().try_for_each(Validate::validate)
    }
}

impl<T: Validate> Validate for Option<T> {
    fn validate(&self) -> Result<(), ValidationError> {
        self.as_ref().map_or(Ok(()), Validate::validate)
    }
}
