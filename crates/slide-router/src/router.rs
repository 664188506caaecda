//! High-level router API.
//!
//! This module provides the main [`Router`] struct which registers route
//! patterns and resolves a request's method and path to the pattern that
//! should serve it.

use http::Method;

use crate::method_router::MethodRouter;
use crate::node::Node;
use crate::pattern::RoutePattern;
use crate::{RouteId, RouteMatch};

/// A radix tree route table.
///
/// # Example
///
/// ```rust
/// use slide_router::Router;
/// use http::Method;
///
/// let mut router = Router::new();
/// let list = router.insert(Method::GET, "/users");
/// let show = router.insert(Method::GET, "/users/:id");
///
/// let found = router.match_route(&Method::GET, "/users/123").unwrap();
/// assert_eq!(found.route, show);
/// assert_eq!(found.pattern.as_str(), "/users/:id");
/// assert_ne!(list, show);
/// ```
///
/// # Route Priority
///
/// 1. **Static segments** (e.g., `/users/me`)
/// 2. **Parameter segments** (e.g., `/users/:id`)
///
/// `/users/me` therefore wins over `/users/:id` for the path `/users/me`.
/// Registering the same method and pattern shape twice replaces the earlier
/// route.
#[derive(Debug, Clone)]
pub struct Router {
    /// Root node of the radix tree
    root: Node,
    /// Registered patterns, indexed by [`RouteId`]
    patterns: Vec<RoutePattern>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    /// Creates a new empty router.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Node::root(),
            patterns: Vec::new(),
        }
    }

    /// Registers `pattern` for `method` and returns its route id.
    pub fn insert(&mut self, method: Method, pattern: impl Into<RoutePattern>) -> RouteId {
        let pattern = pattern.into();
        let route = RouteId::new(self.patterns.len());
        self.root.endpoint(pattern.segments()).insert(method, route);
        self.patterns.push(pattern);
        route
    }

    /// Resolves a method and path to a registered route.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch<'_>> {
        let route = self.root.match_route(method, path)?;
        Some(RouteMatch::new(route, &self.patterns[route.index()]))
    }

    /// Matches a path against the router (without method).
    ///
    /// Useful for generating 405 responses with an `Allow` header.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<&MethodRouter> {
        self.root.match_path(path)
    }

    /// Returns the pattern registered under `route`.
    #[must_use]
    pub fn pattern(&self, route: RouteId) -> Option<&RoutePattern> {
        self.patterns.get(route.index())
    }

    /// Returns the number of routes registered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Returns true if no routes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_router_new() {
        let router = Router::new();
        assert!(router.is_empty());
        assert_eq!(router.len(), 0);
    }

    #[test]
    fn test_router_insert() {
        let mut router = Router::new();
        let route = router.insert(Method::GET, "/users");
        assert_eq!(router.len(), 1);
        assert_eq!(router.pattern(route).map(RoutePattern::as_str), Some("/users"));
    }

    #[test]
    fn test_router_match_param() {
        let mut router = Router::new();
        let route = router.insert(Method::GET, "/name/:name");

        let found = router.match_route(&Method::GET, "/name/slide").unwrap();
        assert_eq!(found.route, route);
        assert_eq!(found.pattern.param("/name/slide", "name"), Some("slide"));
    }

    #[test]
    fn test_router_method_not_allowed() {
        let mut router = Router::new();
        router.insert(Method::GET, "/users");

        assert!(router.match_route(&Method::POST, "/users").is_none());

        let methods = router.match_path("/users").unwrap();
        assert_eq!(methods.allowed_methods().collect::<Vec<_>>(), vec![&Method::GET]);
    }

    #[test]
    fn test_router_no_match() {
        let mut router = Router::new();
        router.insert(Method::GET, "/users");

        assert!(router.match_route(&Method::GET, "/posts").is_none());
        assert!(router.match_path("/posts").is_none());
    }

    #[test]
    fn test_router_multiple_methods() {
        let mut router = Router::new();
        let list = router.insert(Method::GET, "/users");
        let create = router.insert(Method::POST, "/users");

        assert_eq!(router.match_route(&Method::GET, "/users").map(|m| m.route), Some(list));
        assert_eq!(router.match_route(&Method::POST, "/users").map(|m| m.route), Some(create));
    }

    #[test]
    fn test_router_same_shape_keeps_own_pattern() {
        let mut router = Router::new();
        router.insert(Method::GET, "/orgs/:org");
        router.insert(Method::DELETE, "/orgs/:id");

        let found = router.match_route(&Method::DELETE, "/orgs/acme").unwrap();
        assert_eq!(found.pattern.as_str(), "/orgs/:id");
        assert_eq!(found.pattern.param("/orgs/acme", "id"), Some("acme"));
    }

    #[test]
    fn test_router_replaces_duplicate() {
        let mut router = Router::new();
        router.insert(Method::GET, "/users/:id");
        let second = router.insert(Method::GET, "/users/:user");

        let found = router.match_route(&Method::GET, "/users/1").unwrap();
        assert_eq!(found.route, second);
    }

    #[test]
    fn test_router_trailing_slash() {
        let mut router = Router::new();
        router.insert(Method::GET, "/users");

        assert!(router.match_route(&Method::GET, "/users").is_some());
        assert!(router.match_route(&Method::GET, "/users/").is_some());
    }

    #[test]
    fn test_router_complex_paths() {
        let mut router = Router::new();
        router.insert(Method::GET, "/api/v1/users");
        router.insert(Method::GET, "/api/v1/users/:userId");
        router.insert(Method::GET, "/api/v1/users/:userId/posts");
        let post = router.insert(Method::GET, "/api/v1/users/:userId/posts/:postId");

        let found = router
            .match_route(&Method::GET, "/api/v1/users/123/posts/456")
            .unwrap();
        assert_eq!(found.route, post);

        let params = found.pattern.params("/api/v1/users/123/posts/456");
        assert_eq!(params.get("userId"), Some("123"));
        assert_eq!(params.get("postId"), Some("456"));
    }
}
