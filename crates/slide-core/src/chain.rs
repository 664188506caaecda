//! Route chains.
//!
//! A route's chain is the application middleware, then the middleware of the
//! route's group, then the route handler, concatenated once when the
//! application is built. Every request on that route walks the same shared
//! [`Chain`] with its own cursor, held by [`Ctx`](crate::Ctx).
//!
//! ```text
//!   index:   0 .. app_len | app_len .. app_len + group_len | len - 1
//!   entry:   app middleware | group middleware              | handler
//! ```

use std::fmt;

use crate::handler::BoxedHandler;

/// An immutable, ordered route chain.
#[derive(Clone)]
pub struct Chain {
    entries: Box<[BoxedHandler]>,
    app_len: usize,
    group_len: usize,
}

impl Chain {
    /// Concatenates application middleware, group middleware and the handler.
    #[must_use]
    pub fn new(app: &[BoxedHandler], group: &[BoxedHandler], handler: BoxedHandler) -> Self {
        let entries = app
            .iter()
            .chain(group)
            .cloned()
            .chain(std::iter::once(handler))
            .collect();

        Self {
            entries,
            app_len: app.len(),
            group_len: group.len(),
        }
    }

    /// Returns the entry at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&BoxedHandler> {
        self.entries.get(index)
    }

    /// Returns the total number of entries, handler included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false: a chain ends in its handler.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of application middleware entries.
    #[must_use]
    pub fn app_len(&self) -> usize {
        self.app_len
    }

    /// Number of group middleware entries.
    #[must_use]
    pub fn group_len(&self) -> usize {
        self.group_len
    }

    /// Index of the route handler.
    #[must_use]
    pub fn handler_index(&self) -> usize {
        self.app_len + self.group_len
    }

    /// Classifies the entry at `index`.
    #[must_use]
    pub fn position(&self, index: usize) -> ChainState {
        if index < self.app_len {
            ChainState::App(index)
        } else if index < self.handler_index() {
            ChainState::Group(index - self.app_len)
        } else {
            ChainState::Handler
        }
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.entries.iter().map(|entry| entry.name()).collect();
        f.debug_struct("Chain")
            .field("entries", &names)
            .field("app_len", &self.app_len)
            .field("group_len", &self.group_len)
            .finish()
    }
}

/// Progress of one request through its chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainState {
    /// No entry has started.
    BeforeChain,
    /// Application middleware `i` is the innermost running entry.
    App(usize),
    /// Group middleware `j` is the innermost running entry.
    Group(usize),
    /// The route handler is running.
    Handler,
    /// The chain has returned to the dispatcher.
    Done,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Ctx;
    use crate::error::SlideResult;
    use crate::handler::{boxed, BoxFuture};

    fn noop(_ctx: &mut Ctx) -> BoxFuture<'_, SlideResult<()>> {
        Box::pin(async { Ok(()) })
    }

    #[test]
    fn test_chain_layout() {
        let app = vec![boxed(noop), boxed(noop)];
        let group = vec![boxed(noop)];
        let chain = Chain::new(&app, &group, boxed(noop));

        assert_eq!(chain.len(), 4);
        assert_eq!(chain.app_len(), 2);
        assert_eq!(chain.group_len(), 1);
        assert_eq!(chain.handler_index(), 3);
        assert!(chain.get(3).is_some());
        assert!(chain.get(4).is_none());
    }

    #[test]
    fn test_chain_positions() {
        let app = vec![boxed(noop)];
        let group = vec![boxed(noop), boxed(noop)];
        let chain = Chain::new(&app, &group, boxed(noop));

        assert_eq!(chain.position(0), ChainState::App(0));
        assert_eq!(chain.position(1), ChainState::Group(0));
        assert_eq!(chain.position(2), ChainState::Group(1));
        assert_eq!(chain.position(3), ChainState::Handler);
    }

    #[test]
    fn test_handler_only_chain() {
        let chain = Chain::new(&[], &[], boxed(noop));
        assert_eq!(chain.len(), 1);
        assert!(!chain.is_empty());
        assert_eq!(chain.position(0), ChainState::Handler);
    }
}
