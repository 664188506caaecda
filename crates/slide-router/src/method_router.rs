//! HTTP method-based routing.
//!
//! This module provides [`MethodRouter`] which maps HTTP methods to route IDs
//! for a single path shape.

use http::Method;
use smallvec::SmallVec;

use crate::RouteId;

/// Maps HTTP methods to route IDs for a single path.
///
/// # Example
///
/// ```rust
/// use slide_router::{MethodRouter, RouteId};
/// use http::Method;
///
/// let mut router = MethodRouter::new();
/// router.insert(Method::GET, RouteId::new(0));
/// router.insert(Method::POST, RouteId::new(1));
///
/// assert_eq!(router.get(&Method::GET), Some(RouteId::new(0)));
/// assert_eq!(router.get(&Method::DELETE), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MethodRouter {
    entries: SmallVec<[(Method, RouteId); 2]>,
}

impl MethodRouter {
    /// Creates a new empty method router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a route for `method`, returning the route it replaced.
    pub fn insert(&mut self, method: Method, route: RouteId) -> Option<RouteId> {
        match self.entries.iter_mut().find(|(m, _)| *m == method) {
            Some(slot) => Some(std::mem::replace(&mut slot.1, route)),
            None => {
                self.entries.push((method, route));
                None
            }
        }
    }

    /// Returns the route registered for `method`.
    ///
    /// A `HEAD` request falls back to the `GET` route when no explicit
    /// `HEAD` route exists.
    #[must_use]
    pub fn get(&self, method: &Method) -> Option<RouteId> {
        self.find(method).or_else(|| {
            if *method == Method::HEAD {
                self.find(&Method::GET)
            } else {
                None
            }
        })
    }

    fn find(&self, method: &Method) -> Option<RouteId> {
        self.entries
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, route)| *route)
    }

    /// Returns the methods that have a route, in registration order.
    pub fn allowed_methods(&self) -> impl Iterator<Item = &Method> {
        self.entries.iter().map(|(m, _)| m)
    }

    /// Returns true if no method is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
