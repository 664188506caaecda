//! Query string parsing.
//!
//! Operates on the raw query suffix (the text after `?`, without the `?`).
//! Pairs are separated by `&` and split on the first `=`. Values are returned
//! exactly as they appear on the wire; use [`Ctx::query`](crate::Ctx::query)
//! for percent-decoded, typed access.
//!
//! ```
//! use slide_core::query;
//!
//! let raw = "key=test&value=bbp";
//! assert_eq!(query::query_param(raw, "key"), Some("test"));
//!
//! let all = query::query_params(raw);
//! assert_eq!(all.get("value"), Some("bbp"));
//! ```

use slide_router::Params;

/// Iterates the `(key, value)` pairs of a raw query string in order.
///
/// Empty pieces (`a=1&&b=2`, a trailing `&`) are skipped. A piece without
/// `=` yields its whole text as the key and `""` as the value.
pub fn pairs(raw: &str) -> impl Iterator<Item = (&str, &str)> {
    raw.split('&')
        .filter(|piece| !piece.is_empty())
        .map(|piece| piece.split_once('=').unwrap_or((piece, "")))
}

/// Looks up a single key. When a key repeats, the last occurrence wins.
#[must_use]
pub fn query_param<'q>(raw: &'q str, key: &str) -> Option<&'q str> {
    pairs(raw).fold(None, |found, (k, v)| if k == key { Some(v) } else { found })
}

/// Builds the full key→value mapping. Keys are unique; the last occurrence
/// of a repeated key wins.
#[must_use]
pub fn query_params(raw: &str) -> Params {
    pairs(raw).collect()
}
