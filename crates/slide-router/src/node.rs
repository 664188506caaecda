//! Radix tree node implementation.
//!
//! Each node stands for one path segment. Static children are kept sorted for
//! binary search; all parameter segments at a given depth share a single
//! parameter child, whatever their names, because names only matter when a
//! handler reads its own route pattern.

use http::Method;

use crate::method_router::MethodRouter;
use crate::pattern::{self, Segment};
use crate::RouteId;

/// Type of path segment in the radix tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentKind {
    /// Static path segment (e.g., "users", "api")
    Static,
    /// Parameter segment (e.g., ":id")
    Param,
}

/// A node in the radix tree.
#[derive(Debug, Clone)]
pub struct Node {
    /// The path segment this node represents
    pub segment: String,

    /// The kind of segment (static or param)
    pub kind: SegmentKind,

    /// Method router for this node (if it's a route endpoint)
    pub methods: Option<MethodRouter>,

    /// Static children, sorted by segment for binary search
    pub static_children: Vec<Node>,

    /// Parameter child (at most one per node)
    pub param_child: Option<Box<Node>>,
}

impl Node {
    /// Creates a new static node.
    #[must_use]
    pub fn new_static(segment: impl Into<String>) -> Self {
        Self {
            segment: segment.into(),
            kind: SegmentKind::Static,
            methods: None,
            static_children: Vec::new(),
            param_child: None,
        }
    }

    /// Creates a new parameter node.
    #[must_use]
    pub fn new_param() -> Self {
        Self {
            segment: String::from(":"),
            kind: SegmentKind::Param,
            methods: None,
            static_children: Vec::new(),
            param_child: None,
        }
    }

    /// Creates a root node for the tree.
    #[must_use]
    pub fn root() -> Self {
        Self::new_static("")
    }

    /// Returns the method router at the node reached by `segments`,
    /// creating intermediate nodes as needed.
    pub fn endpoint(&mut self, segments: &[Segment]) -> &mut MethodRouter {
        let Some((first, remaining)) = segments.split_first() else {
            return self.methods.get_or_insert_with(MethodRouter::new);
        };

        match first {
            Segment::Literal(literal) => {
                let index = match self
                    .static_children
                    .binary_search_by(|c| c.segment.as_str().cmp(literal.as_str()))
                {
                    Ok(index) => index,
                    Err(index) => {
                        self.static_children.insert(index, Node::new_static(literal.clone()));
                        index
                    }
                };
                self.static_children[index].endpoint(remaining)
            }
            Segment::Param(_) => self
                .param_child
                .get_or_insert_with(|| Box::new(Node::new_param()))
                .endpoint(remaining),
        }
    }

    /// Matches a concrete request path against the tree, returning the
    /// first endpoint that has any method registered.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<&MethodRouter> {
        let segments: Vec<&str> = pattern::segments(path).collect();
        self.match_segments(&segments, &|m: &MethodRouter| !m.is_empty())
    }

    /// Matches a path and method, so that a static branch registered for
    /// other methods does not hide a parameter branch that serves `method`.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteId> {
        let segments: Vec<&str> = pattern::segments(path).collect();
        self.match_segments(&segments, &|m: &MethodRouter| m.get(method).is_some())
            .and_then(|methods| methods.get(method))
    }

    /// Matches segments recursively, preferring static children and
    /// backtracking into the parameter child when a static branch dead-ends.
    fn match_segments<F>(&self, segments: &[&str], accept: &F) -> Option<&MethodRouter>
    where
        F: Fn(&MethodRouter) -> bool,
    {
        let Some((segment, remaining)) = segments.split_first() else {
            return self.methods.as_ref().filter(|m| accept(m));
        };

        if let Some(result) = self
            .find_static_child(segment)
            .and_then(|child| child.match_segments(remaining, accept))
        {
            return Some(result);
        }

        self.param_child
            .as_ref()
            .and_then(|child| child.match_segments(remaining, accept))
    }

    /// Finds a static child by segment using binary search.
    fn find_static_child(&self, segment: &str) -> Option<&Node> {
        self.static_children
            .binary_search_by(|c| c.segment.as_str().cmp(segment))
            .ok()
            .map(|i| &self.static_children[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RoutePattern;

    fn insert(root: &mut Node, raw: &str, route: usize) {
        let pattern = RoutePattern::parse(raw);
        root.endpoint(pattern.segments())
            .insert(Method::GET, RouteId::new(route));
    }

    fn matched(root: &Node, path: &str) -> Option<RouteId> {
        root.match_route(&Method::GET, path)
    }

    #[test]
    fn test_node_new_static() {
        let node = Node::new_static("users");
        assert_eq!(node.segment, "users");
        assert_eq!(node.kind, SegmentKind::Static);
    }

    #[test]
    fn test_node_new_param() {
        let node = Node::new_param();
        assert_eq!(node.kind, SegmentKind::Param);
    }

    #[test]
    fn test_insert_and_match_static() {
        let mut root = Node::root();
        insert(&mut root, "/users", 0);

        assert_eq!(matched(&root, "/users"), Some(RouteId::new(0)));
        assert_eq!(matched(&root, "/posts"), None);
    }

    #[test]
    fn test_insert_and_match_param() {
        let mut root = Node::root();
        insert(&mut root, "/users/:id", 0);

        assert_eq!(matched(&root, "/users/123"), Some(RouteId::new(0)));
        assert_eq!(matched(&root, "/users"), None);
    }

    #[test]
    fn test_static_priority_over_param() {
        let mut root = Node::root();
        insert(&mut root, "/users/me", 0);
        insert(&mut root, "/users/:id", 1);

        assert_eq!(matched(&root, "/users/me"), Some(RouteId::new(0)));
        assert_eq!(matched(&root, "/users/123"), Some(RouteId::new(1)));
    }

    #[test]
    fn test_backtracks_from_static_into_param() {
        let mut root = Node::root();
        insert(&mut root, "/users/me/settings", 0);
        insert(&mut root, "/users/:id/posts", 1);

        // "me" matches the static branch, which has no "posts" child.
        assert_eq!(matched(&root, "/users/me/posts"), Some(RouteId::new(1)));
    }

    #[test]
    fn test_shared_param_child_with_different_names() {
        let mut root = Node::root();
        insert(&mut root, "/orgs/:org", 0);
        insert(&mut root, "/orgs/:id/users", 1);

        assert_eq!(matched(&root, "/orgs/acme"), Some(RouteId::new(0)));
        assert_eq!(matched(&root, "/orgs/acme/users"), Some(RouteId::new(1)));
    }

    #[test]
    fn test_method_aware_backtracking() {
        let mut root = Node::root();
        insert(&mut root, "/users/me", 0);
        let pattern = RoutePattern::parse("/users/:id");
        root.endpoint(pattern.segments())
            .insert(Method::DELETE, RouteId::new(1));

        assert_eq!(root.match_route(&Method::DELETE, "/users/me"), Some(RouteId::new(1)));
        assert_eq!(root.match_route(&Method::GET, "/users/me"), Some(RouteId::new(0)));
        assert_eq!(root.match_route(&Method::GET, "/users/42"), None);
        assert!(root.match_path("/users/42").is_some());
    }

    #[test]
    fn test_intermediate_node_is_not_a_route() {
        let mut root = Node::root();
        insert(&mut root, "/api/v1/users", 0);

        assert_eq!(matched(&root, "/api/v1"), None);
    }

    #[test]
    fn test_root_route() {
        let mut root = Node::root();
        insert(&mut root, "/", 0);

        assert_eq!(matched(&root, "/"), Some(RouteId::new(0)));
        assert_eq!(matched(&root, ""), Some(RouteId::new(0)));
    }
}
