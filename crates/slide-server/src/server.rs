//! HTTP/1.1 serving loop.
//!
//! The server accepts TCP connections, serves each one on its own task with
//! hyper, and hands every request to the shared [`App`]. Per request it
//! enforces the body limit and the request timeout from
//! [`ServerConfig`](slide_config::ServerConfig). On shutdown it stops
//! accepting, lets open connections finish their current request, and
//! waits up to `shutdown_timeout_secs` for them to close.
//!
//! ```rust,no_run
//! use slide_config::ConfigLoader;
//! use slide_server::{Server, Slide};
//!
//! # async fn run() -> Result<(), slide_server::ServerError> {
//! let config = ConfigLoader::new().with_env_prefix("SLIDE").load()?;
//! let app = Slide::from_config(&config).build();
//! Server::new(app, config.server).run().await
//! # }
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::{header, HeaderValue, Request, Response, StatusCode};
use http_body_util::{BodyExt, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use slide_config::ServerConfig;
use slide_core::{ErrorDetail, ErrorEnvelope};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

use crate::app::App;
use crate::body::{full, SlideBody};
use crate::error::{ServerError, ServerResult};
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// Serves an [`App`] over HTTP/1.1.
#[derive(Debug)]
pub struct Server {
    app: Arc<App>,
    config: ServerConfig,
}

impl Server {
    /// Creates a server for `app` with the given server settings.
    #[must_use]
    pub fn new(app: App, config: ServerConfig) -> Self {
        Self {
            app: Arc::new(app),
            config,
        }
    }

    /// The application being served.
    #[must_use]
    pub fn app(&self) -> &App {
        &self.app
    }

    /// The server settings.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Binds `server.http_addr` and serves until SIGINT or SIGTERM.
    pub async fn run(self) -> ServerResult<()> {
        let shutdown = ShutdownSignal::with_os_signals();
        self.run_with_shutdown(shutdown).await
    }

    /// Binds `server.http_addr` and serves until `shutdown` fires.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> ServerResult<()> {
        let addr: SocketAddr = self.config.http_addr.parse().map_err(|_| {
            slide_config::ConfigError::invalid_value(
                "server.http_addr",
                format!("invalid socket address: {}", self.config.http_addr),
            )
        })?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;

        self.serve(listener, shutdown).await
    }

    /// Serves connections from an already bound listener until `shutdown`
    /// fires.
    pub async fn serve(self, listener: TcpListener, shutdown: ShutdownSignal) -> ServerResult<()> {
        let local_addr = listener.local_addr()?;
        info!(addr = %local_addr, "server listening");

        let limits = Arc::new(Limits::from(&self.config));
        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, remote_addr)) => {
                        let app = Arc::clone(&self.app);
                        let limits = Arc::clone(&limits);
                        let shutdown = shutdown.clone();
                        let token = tracker.acquire();

                        tokio::spawn(async move {
                            serve_connection(app, limits, stream, remote_addr, shutdown).await;
                            drop(token);
                        });
                    }
                    Err(err) => error!(error = %err, "failed to accept connection"),
                },
                () = shutdown.recv() => {
                    info!("shutdown signal received, no longer accepting connections");
                    break;
                }
            }
        }

        drop(listener);

        let grace = Duration::from_secs(self.config.shutdown_timeout_secs);
        info!(
            open_connections = tracker.active_connections(),
            grace_secs = grace.as_secs(),
            "draining connections"
        );

        tokio::select! {
            () = tracker.wait_for_shutdown() => info!("all connections closed"),
            () = tokio::time::sleep(grace) => warn!(
                open_connections = tracker.active_connections(),
                "shutdown grace period elapsed"
            ),
        }

        info!("server stopped");
        Ok(())
    }
}

/// Per-request limits derived from the server settings.
#[derive(Debug, Clone, Copy)]
struct Limits {
    request_timeout: Duration,
    max_body_bytes: usize,
}

impl From<&ServerConfig> for Limits {
    fn from(config: &ServerConfig) -> Self {
        Self {
            request_timeout: Duration::from_millis(config.request_timeout_ms),
            max_body_bytes: usize::try_from(config.max_body_bytes).unwrap_or(usize::MAX),
        }
    }
}

async fn serve_connection(
    app: Arc<App>,
    limits: Arc<Limits>,
    stream: TcpStream,
    remote_addr: SocketAddr,
    shutdown: ShutdownSignal,
) {
    let service = service_fn(move |request: Request<Incoming>| {
        let app = Arc::clone(&app);
        let limits = Arc::clone(&limits);
        async move { Ok::<_, Infallible>(handle_request(&app, *limits, request).await) }
    });

    let connection = http1::Builder::new()
        .timer(TokioTimer::new())
        .serve_connection(TokioIo::new(stream), service);
    tokio::pin!(connection);

    let result = tokio::select! {
        result = connection.as_mut() => result,
        () = shutdown.recv() => {
            // Finish the in-flight request, then close.
            connection.as_mut().graceful_shutdown();
            connection.as_mut().await
        }
    };

    if let Err(err) = result {
        debug!(remote = %remote_addr, error = %err, "connection closed with error");
    }
}

/// Reads the body within the limits and runs the request through the app.
async fn handle_request(
    app: &App,
    limits: Limits,
    request: Request<Incoming>,
) -> Response<SlideBody> {
    let declared_too_large = request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .is_some_and(|len| usize::try_from(len).map_or(true, |len| len > limits.max_body_bytes));
    if declared_too_large {
        return limit_response(
            StatusCode::PAYLOAD_TOO_LARGE,
            "PAYLOAD_TOO_LARGE",
            "request body exceeds the configured limit",
        );
    }

    let work = async {
        let (parts, body) = request.into_parts();
        let body = match Limited::new(body, limits.max_body_bytes).collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(err) if err.is::<http_body_util::LengthLimitError>() => {
                return limit_response(
                    StatusCode::PAYLOAD_TOO_LARGE,
                    "PAYLOAD_TOO_LARGE",
                    "request body exceeds the configured limit",
                );
            }
            Err(err) => {
                warn!(error = %err, "failed to read request body");
                return limit_response(
                    StatusCode::BAD_REQUEST,
                    "BODY_READ_ERROR",
                    "failed to read request body",
                );
            }
        };

        app.handle(Request::from_parts(parts, body)).await
    };

    match tokio::time::timeout(limits.request_timeout, work).await {
        Ok(response) => response,
        Err(_) => {
            warn!(
                timeout_ms = u64::try_from(limits.request_timeout.as_millis()).unwrap_or(u64::MAX),
                "request timed out"
            );
            limit_response(
                StatusCode::SERVICE_UNAVAILABLE,
                "REQUEST_TIMEOUT",
                "request did not complete in time",
            )
        }
    }
}

/// A JSON error response produced outside any chain.
fn limit_response(status: StatusCode, code: &str, message: &str) -> Response<SlideBody> {
    let envelope = ErrorEnvelope {
        error: ErrorDetail {
            code: code.to_string(),
            message: message.to_string(),
            request_id: None,
            details: None,
        },
    };
    let body = serde_json::to_vec(&envelope).unwrap_or_default();

    let mut response = Response::new(full(Bytes::from(body)));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    response
}
