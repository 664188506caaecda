//! Graceful shutdown.
//!
//! A [`ShutdownSignal`] is shared by the accept loop and every connection
//! task. Once triggered (by SIGINT/SIGTERM or by calling
//! [`trigger`](ShutdownSignal::trigger)) the server stops accepting, and
//! open connections finish their in-flight request before closing. The
//! [`ConnectionTracker`] lets the server wait for that drain.
//!
//! ```rust
//! use slide_server::ShutdownSignal;
//!
//! let shutdown = ShutdownSignal::new();
//! let handle = shutdown.clone();
//!
//! handle.trigger();
//! assert!(shutdown.is_shutdown());
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use tracing::{error, info};

/// A cloneable, idempotent shutdown trigger.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    token: CancellationToken,
}

impl ShutdownSignal {
    /// Creates an untriggered signal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a signal that also fires on SIGTERM or SIGINT.
    ///
    /// Must be called inside a Tokio runtime.
    #[must_use]
    pub fn with_os_signals() -> Self {
        let signal = Self::new();
        let handle = signal.clone();

        tokio::spawn(async move {
            wait_for_os_signal().await;
            handle.trigger();
        });

        signal
    }

    /// Starts shutdown. Repeated calls have no further effect.
    pub fn trigger(&self) {
        self.token.cancel();
    }

    /// Returns true once shutdown has started.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Completes when shutdown starts, immediately if it already has.
    pub fn recv(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }
}

/// Waits for SIGTERM or SIGINT (Ctrl+C elsewhere).
///
/// If no handler can be installed this never completes and only a
/// programmatic trigger stops the server.
async fn wait_for_os_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let (mut sigterm, mut sigint) =
            match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(term), Ok(int)) => (term, int),
                (Err(err), _) | (_, Err(err)) => {
                    error!(error = %err, "failed to register signal handlers");
                    return std::future::pending().await;
                }
            };

        tokio::select! {
            _ = sigterm.recv() => info!("received SIGTERM, starting graceful shutdown"),
            _ = sigint.recv() => info!("received SIGINT, starting graceful shutdown"),
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for Ctrl+C");
            return std::future::pending().await;
        }
        info!("received Ctrl+C, starting graceful shutdown");
    }
}

/// Counts open connections so shutdown can wait for them to drain.
///
/// ```rust
/// use slide_server::ConnectionTracker;
///
/// let tracker = ConnectionTracker::new();
/// let token = tracker.acquire();
/// assert_eq!(tracker.active_connections(), 1);
///
/// drop(token);
/// assert_eq!(tracker.active_connections(), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    inner: Arc<TrackerInner>,
}

#[derive(Debug, Default)]
struct TrackerInner {
    active: AtomicUsize,
    drained: Notify,
}

impl ConnectionTracker {
    /// Creates a tracker with no connections.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection; it counts as open until the token drops.
    #[must_use]
    pub fn acquire(&self) -> ConnectionToken {
        self.inner.active.fetch_add(1, Ordering::SeqCst);
        ConnectionToken {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Number of open connections.
    #[must_use]
    pub fn active_connections(&self) -> usize {
        self.inner.active.load(Ordering::SeqCst)
    }

    /// Completes once no connection is open.
    pub async fn wait_for_shutdown(&self) {
        loop {
            // Registered before the check so a final drop in between is seen.
            let drained = self.inner.drained.notified();
            if self.active_connections() == 0 {
                return;
            }
            drained.await;
        }
    }
}

/// Keeps one connection counted as open.
#[derive(Debug)]
pub struct ConnectionToken {
    inner: Arc<TrackerInner>,
}

impl Drop for ConnectionToken {
    fn drop(&mut self) {
        if self.inner.active.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.inner.drained.notify_waiters();
        }
    }
}
