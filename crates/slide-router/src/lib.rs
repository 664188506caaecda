//! Route patterns and routing for Slide.
//!
//! This crate owns everything that deals with path templates:
//!
//! - [`pattern`] - the path pattern matcher that binds `:name` segments of a
//!   route pattern to the segments of a concrete request path
//! - [`Params`] - the unique-key name→value mapping returned by the matcher
//!   (and reused for query strings)
//! - [`Router`] - a radix tree that resolves `(method, path)` to the
//!   registered [`RoutePattern`] serving it
//!
//! # Example
//!
//! ```rust
//! use slide_router::Router;
//! use http::Method;
//!
//! let mut router = Router::new();
//! router.insert(Method::GET, "/auth/:name/:age");
//!
//! let found = router.match_route(&Method::GET, "/auth/madhuri/32").unwrap();
//! let params = found.pattern.params("/auth/madhuri/32");
//! assert_eq!(params.get("name"), Some("madhuri"));
//! assert_eq!(params.get("age"), Some("32"));
//! ```
//!
//! # Architecture
//!
//! ```text
//!                    (root)
//!                      │
//!              ┌───────┴───────┐
//!              │               │
//!            "users"         "auth"
//!              │               │
//!        ┌─────┴─────┐        ":"
//!        │           │         │
//!      "me"         ":"       ":"
//!     [GET]      [GET,DELETE] [GET]
//! ```

#![forbid(unsafe_code)]

mod method_router;
mod node;
mod params;
pub mod pattern;
mod router;

pub use method_router::MethodRouter;
pub use node::Node;
pub use params::Params;
pub use pattern::{RoutePattern, Segment};
pub use router::Router;

/// Identifier of a registered route, assigned in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteId(usize);

impl RouteId {
    /// Creates a route id from its registration index.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the registration index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// A resolved route: its id and the pattern it was registered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteMatch<'a> {
    /// The matched route
    pub route: RouteId,
    /// The registered pattern of the matched route
    pub pattern: &'a RoutePattern,
}

impl<'a> RouteMatch<'a> {
    /// Creates a new route match.
    #[must_use]
    pub fn new(route: RouteId, pattern: &'a RoutePattern) -> Self {
        Self { route, pattern }
    }
}
