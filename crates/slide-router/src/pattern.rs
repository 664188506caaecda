//! Route pattern parsing and path parameter matching.
//!
//! A route pattern is a path template made of literal segments and named
//! parameter segments, e.g. `/auth/:name/:age`. Matching a pattern against a
//! concrete request path aligns the two segment by segment and binds every
//! parameter name to the path segment at the same position.
//!
//! Segmentation strips all leading and trailing slashes and then splits on
//! `/`, so `/name/slide/` and `name/slide` both have two segments while
//! `/a//b` keeps its empty middle segment.
//!
//! Literal segments are never compared here. The route table has already
//! selected a compatible pattern by the time parameters are looked up, so
//! the matcher only checks that both sides have the same number of segments.
//!
//! # Example
//!
//! ```rust
//! use slide_router::pattern;
//!
//! assert_eq!(pattern::param("/name/:name", "/name/slide", "name"), Some("slide"));
//!
//! let params = pattern::params("/auth/:name/:age", "/auth/madhuri/32");
//! assert_eq!(params.get("name"), Some("madhuri"));
//! assert_eq!(params.get("age"), Some("32"));
//!
//! // Segment counts differ: nothing is bound.
//! assert!(pattern::params("/auth/:name/:age", "/auth/madhuri").is_empty());
//! ```

use std::fmt;
use std::str::FromStr;

use crate::params::Params;

/// Prefix marking a parameter segment in a route pattern.
pub const PARAM_PREFIX: char = ':';

/// Splits a path or pattern into its segments.
///
/// Leading and trailing slashes are discarded; an empty or all-slash input
/// has no segments.
pub fn segments(path: &str) -> impl Iterator<Item = &str> + Clone {
    let trimmed = path.trim_matches('/');
    (!trimmed.is_empty())
        .then(|| trimmed.split('/'))
        .into_iter()
        .flatten()
}

/// Looks up a single parameter by aligning `pattern` against `path`.
///
/// Returns `None` when the segment counts differ or when `name` is not a
/// parameter of `pattern`. If a name appears more than once in the pattern,
/// the right-most binding is returned, matching [`params`].
#[must_use]
pub fn param<'p>(pattern: &str, path: &'p str, name: &str) -> Option<&'p str> {
    if segments(pattern).count() != segments(path).count() {
        return None;
    }

    let mut found = None;
    for (pat, value) in segments(pattern).zip(segments(path)) {
        if pat.strip_prefix(PARAM_PREFIX) == Some(name) {
            found = Some(value);
        }
    }
    found
}

/// Builds the full name→value mapping for `pattern` aligned against `path`.
///
/// Returns an empty mapping when the segment counts differ.
#[must_use]
pub fn params(pattern: &str, path: &str) -> Params {
    if segments(pattern).count() != segments(path).count() {
        return Params::new();
    }

    segments(pattern)
        .zip(segments(path))
        .filter_map(|(pat, value)| pat.strip_prefix(PARAM_PREFIX).map(|name| (name, value)))
        .collect()
}

/// One segment of a parsed [`RoutePattern`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// A literal segment that the route table compares verbatim.
    Literal(String),
    /// A named parameter segment (`:name`), stored without the prefix.
    Param(String),
}

impl Segment {
    fn parse(raw: &str) -> Self {
        match raw.strip_prefix(PARAM_PREFIX) {
            Some(name) => Self::Param(name.to_string()),
            None => Self::Literal(raw.to_string()),
        }
    }

    /// Returns the parameter name if this is a parameter segment.
    #[must_use]
    pub fn param_name(&self) -> Option<&str> {
        match self {
            Self::Param(name) => Some(name),
            Self::Literal(_) => None,
        }
    }
}

/// A route pattern parsed once at registration time.
///
/// Holds the original template text alongside its segments so that lookups
/// at request time only need to split the request path.
///
/// # Example
///
/// ```rust
/// use slide_router::RoutePattern;
///
/// let pattern = RoutePattern::parse("/users/:id/posts/:post");
/// assert_eq!(pattern.len(), 4);
/// assert_eq!(pattern.param_names().collect::<Vec<_>>(), vec!["id", "post"]);
/// assert_eq!(pattern.param("/users/7/posts/42", "post"), Some("42"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoutePattern {
    raw: String,
    segments: Vec<Segment>,
}

impl RoutePattern {
    /// Parses a route pattern.
    #[must_use]
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let segments = segments(&raw).map(Segment::parse).collect();
        Self { raw, segments }
    }

    /// Returns the pattern text as registered.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the parsed segments.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns the number of segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns true for the root pattern (`/`), which has no segments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns the parameter names in positional order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(Segment::param_name)
    }

    /// Looks up a single parameter in `path`. See [`param`].
    #[must_use]
    pub fn param<'p>(&self, path: &'p str, name: &str) -> Option<&'p str> {
        if segments(path).count() != self.segments.len() {
            return None;
        }

        let mut found = None;
        for (segment, value) in self.segments.iter().zip(segments(path)) {
            if segment.param_name() == Some(name) {
                found = Some(value);
            }
        }
        found
    }

    /// Builds the full parameter mapping for `path`. See [`params`].
    #[must_use]
    pub fn params(&self, path: &str) -> Params {
        if segments(path).count() != self.segments.len() {
            return Params::new();
        }

        self.segments
            .iter()
            .zip(segments(path))
            .filter_map(|(segment, value)| segment.param_name().map(|name| (name, value)))
            .collect()
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for RoutePattern {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for RoutePattern {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl From<String> for RoutePattern {
    fn from(raw: String) -> Self {
        Self::parse(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments_strip_outer_slashes() {
        assert_eq!(segments("/name/slide/").collect::<Vec<_>>(), vec!["name", "slide"]);
        assert_eq!(segments("name/slide").collect::<Vec<_>>(), vec!["name", "slide"]);
        assert_eq!(segments("//name//").collect::<Vec<_>>(), vec!["name"]);
    }

    #[test]
    fn test_segments_empty_inputs() {
        assert_eq!(segments("").count(), 0);
        assert_eq!(segments("/").count(), 0);
        assert_eq!(segments("///").count(), 0);
    }

    #[test]
    fn test_segments_keep_interior_empty() {
        assert_eq!(segments("/a//b").collect::<Vec<_>>(), vec!["a", "", "b"]);
    }

    #[test]
    fn test_param_single() {
        assert_eq!(param("/name/:name", "/name/slide", "name"), Some("slide"));
    }

    #[test]
    fn test_param_missing_name() {
        assert_eq!(param("/name/:name", "/name/slide", "id"), None);
    }

    #[test]
    fn test_param_count_mismatch() {
        assert_eq!(param("/name/:name", "/name/slide/extra", "name"), None);
        assert_eq!(param("/name/:name", "/name", "name"), None);
    }

    #[test]
    fn test_param_literal_not_revalidated() {
        // The route table already chose this pattern; literals are not compared.
        assert_eq!(param("/name/:name", "/other/slide", "name"), Some("slide"));
    }

    #[test]
    fn test_param_trailing_slash() {
        assert_eq!(param("/name/:name/", "/name/slide", "name"), Some("slide"));
        assert_eq!(param("/name/:name", "/name/slide/", "name"), Some("slide"));
    }

    #[test]
    fn test_params_bulk() {
        let params = params("/auth/:name/:age", "/auth/madhuri/32");
        assert_eq!(params.len(), 2);
        assert_eq!(params.get("name"), Some("madhuri"));
        assert_eq!(params.get("age"), Some("32"));
    }

    #[test]
    fn test_params_literal_only() {
        assert!(params("/health/live", "/health/live").is_empty());
    }

    #[test]
    fn test_params_count_mismatch_is_empty() {
        assert!(params("/auth/:name/:age", "/auth/madhuri").is_empty());
        assert!(params("/", "/anything").is_empty());
    }

    #[test]
    fn test_params_repeated_name_last_wins() {
        let params = params("/:id/x/:id", "/1/x/2");
        assert_eq!(params.len(), 1);
        assert_eq!(params.get("id"), Some("2"));
        assert_eq!(param("/:id/x/:id", "/1/x/2", "id"), Some("2"));
    }

    #[test]
    fn test_params_empty_interior_segment_binds_empty() {
        let params = params("/a/:b/c", "/a//c");
        assert_eq!(params.get("b"), Some(""));
    }

    #[test]
    fn test_route_pattern_parse() {
        let pattern = RoutePattern::parse("/users/:id/posts");
        assert_eq!(pattern.as_str(), "/users/:id/posts");
        assert_eq!(
            pattern.segments(),
            &[
                Segment::Literal("users".to_string()),
                Segment::Param("id".to_string()),
                Segment::Literal("posts".to_string()),
            ]
        );
    }

    #[test]
    fn test_route_pattern_root() {
        let pattern = RoutePattern::parse("/");
        assert!(pattern.is_empty());
        assert!(pattern.params("/").is_empty());
    }

    #[test]
    fn test_route_pattern_agrees_with_free_functions() {
        let raw = "/auth/:name/:age";
        let pattern = RoutePattern::parse(raw);
        let path = "/auth/madhuri/32";

        assert_eq!(pattern.params(path), params(raw, path));
        assert_eq!(pattern.param(path, "age"), param(raw, path, "age"));
        assert_eq!(pattern.param("/auth", "age"), None);
    }

    #[test]
    fn test_route_pattern_display() {
        let pattern: RoutePattern = "/name/:name".parse().unwrap();
        assert_eq!(pattern.to_string(), "/name/:name");
    }
}
