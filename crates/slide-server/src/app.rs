//! Application builder and per-request dispatch.
//!
//! [`Slide`] collects application middleware, groups and routes. Calling
//! [`build`](Slide::build) freezes every route into one [`Chain`]
//! (application middleware, then the middleware of each enclosing group,
//! then the handler), so middleware registered after a route still applies
//! to it. The resulting [`App`] is immutable and shared by all connections.
//!
//! ```rust
//! use http::StatusCode;
//! use slide_core::{BoxFuture, Ctx, SlideResult};
//! use slide_middleware::RequestIdMiddleware;
//! use slide_server::Slide;
//!
//! fn show_user(ctx: &mut Ctx) -> BoxFuture<'_, SlideResult<()>> {
//!     Box::pin(async move {
//!         let id = ctx.param("id").to_string();
//!         ctx.send(StatusCode::OK, id)
//!     })
//! }
//!
//! let mut slide = Slide::new();
//! slide.use_middleware(RequestIdMiddleware::new());
//! slide.group("/api").get("/users/:id", show_user);
//! let app = slide.build();
//! assert_eq!(app.route_count(), 1);
//! ```

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use http::{header, HeaderValue, Method, Request, Response, StatusCode};
use slide_config::SlideConfig;
use slide_core::{
    boxed, AppConfig, BoxFuture, BoxedHandler, Chain, Ctx, ErrorDetail, ErrorEnvelope, Exchange,
    Handler, RoutePattern, SlideResult,
};
use slide_middleware::{request_id, write_error};
use slide_router::Router;
use tracing::{debug, error};

use crate::body::{into_http_response, SlideBody};

/// Builder for an [`App`].
#[derive(Default)]
pub struct Slide {
    config: AppConfig,
    middleware: Vec<BoxedHandler>,
    groups: Vec<GroupDef>,
    routes: Vec<RouteDef>,
}

struct GroupDef {
    parent: Option<usize>,
    prefix: String,
    middleware: Vec<BoxedHandler>,
}

struct RouteDef {
    method: Method,
    pattern: String,
    group: Option<usize>,
    handler: BoxedHandler,
}

impl Slide {
    /// Creates an empty application with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty application with the given settings.
    #[must_use]
    pub fn with_config(config: AppConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Creates an empty application configured from a loaded [`SlideConfig`].
    #[must_use]
    pub fn from_config(config: &SlideConfig) -> Self {
        Self::with_config(app_config(config))
    }

    /// Replaces the settings shared with every request context.
    pub fn set_config(&mut self, config: AppConfig) -> &mut Self {
        self.config = config;
        self
    }

    /// Appends an application middleware, run for every request.
    pub fn use_middleware(&mut self, middleware: impl Handler) -> &mut Self {
        self.middleware.push(boxed(middleware));
        self
    }

    /// Registers a route for `method`. A later registration for the same
    /// method and pattern shape replaces this one.
    pub fn route(&mut self, method: Method, pattern: &str, handler: impl Handler) -> &mut Self {
        self.add_route(method, pattern.to_string(), None, boxed(handler));
        self
    }

    /// Registers a `GET` route. `HEAD` requests fall back to it.
    pub fn get(&mut self, pattern: &str, handler: impl Handler) -> &mut Self {
        self.route(Method::GET, pattern, handler)
    }

    /// Registers a `POST` route.
    pub fn post(&mut self, pattern: &str, handler: impl Handler) -> &mut Self {
        self.route(Method::POST, pattern, handler)
    }

    /// Registers a `PUT` route.
    pub fn put(&mut self, pattern: &str, handler: impl Handler) -> &mut Self {
        self.route(Method::PUT, pattern, handler)
    }

    /// Registers a `PATCH` route.
    pub fn patch(&mut self, pattern: &str, handler: impl Handler) -> &mut Self {
        self.route(Method::PATCH, pattern, handler)
    }

    /// Registers a `DELETE` route.
    pub fn delete(&mut self, pattern: &str, handler: impl Handler) -> &mut Self {
        self.route(Method::DELETE, pattern, handler)
    }

    /// Opens a route group under `prefix` with its own middleware.
    pub fn group(&mut self, prefix: &str) -> Group<'_> {
        let index = self.add_group(None, prefix);
        Group { slide: self, index }
    }

    fn add_group(&mut self, parent: Option<usize>, prefix: &str) -> usize {
        let prefix = match parent {
            Some(parent) => join_paths(&self.groups[parent].prefix, prefix),
            None => join_paths("", prefix),
        };
        self.groups.push(GroupDef {
            parent,
            prefix,
            middleware: Vec::new(),
        });
        self.groups.len() - 1
    }

    fn add_route(
        &mut self,
        method: Method,
        pattern: String,
        group: Option<usize>,
        handler: BoxedHandler,
    ) {
        self.routes.push(RouteDef {
            method,
            pattern,
            group,
            handler,
        });
    }

    /// Middleware of `group` and its ancestors, outermost first.
    fn group_middleware(&self, group: Option<usize>) -> Vec<BoxedHandler> {
        let mut lineage = Vec::new();
        let mut current = group;
        while let Some(index) = current {
            lineage.push(index);
            current = self.groups[index].parent;
        }

        lineage
            .into_iter()
            .rev()
            .flat_map(|index| self.groups[index].middleware.iter().cloned())
            .collect()
    }

    /// Freezes routes and chains into an immutable [`App`].
    #[must_use]
    pub fn build(self) -> App {
        let mut router = Router::new();
        let mut routes = Vec::with_capacity(self.routes.len());

        for route in &self.routes {
            let pattern = match route.group {
                Some(group) => join_paths(&self.groups[group].prefix, &route.pattern),
                None => join_paths("", &route.pattern),
            };
            let id = router.insert(route.method.clone(), pattern.as_str());
            debug_assert_eq!(id.index(), routes.len());

            let chain = Chain::new(
                &self.middleware,
                &self.group_middleware(route.group),
                Arc::clone(&route.handler),
            );
            debug!(method = %route.method, route = %pattern, chain = ?chain, "route registered");

            routes.push(FrozenRoute {
                pattern: Arc::new(RoutePattern::parse(pattern)),
                chain: Arc::new(chain),
            });
        }

        let not_found = Chain::new(&self.middleware, &[], boxed(Unmatched::NotFound));

        App {
            router,
            routes,
            not_found: Arc::new(not_found),
            middleware: self.middleware.into(),
            config: Arc::new(self.config),
            unmatched_pattern: Arc::new(RoutePattern::parse("")),
        }
    }
}

impl fmt::Debug for Slide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slide")
            .field("config", &self.config)
            .field("middleware", &self.middleware.len())
            .field("groups", &self.groups.len())
            .field("routes", &self.routes.len())
            .finish()
    }
}

/// A set of routes sharing a path prefix and middleware.
///
/// Group middleware runs after all application middleware and before the
/// route handler. Nested groups run their parent's middleware first.
pub struct Group<'a> {
    slide: &'a mut Slide,
    index: usize,
}

impl Group<'_> {
    /// Appends a middleware that runs for every route of this group.
    pub fn use_middleware(&mut self, middleware: impl Handler) -> &mut Self {
        self.slide.groups[self.index]
            .middleware
            .push(boxed(middleware));
        self
    }

    /// Registers a route under this group's prefix.
    pub fn route(&mut self, method: Method, pattern: &str, handler: impl Handler) -> &mut Self {
        self.slide
            .add_route(method, pattern.to_string(), Some(self.index), boxed(handler));
        self
    }

    /// Registers a `GET` route.
    pub fn get(&mut self, pattern: &str, handler: impl Handler) -> &mut Self {
        self.route(Method::GET, pattern, handler)
    }

    /// Registers a `POST` route.
    pub fn post(&mut self, pattern: &str, handler: impl Handler) -> &mut Self {
        self.route(Method::POST, pattern, handler)
    }

    /// Registers a `PUT` route.
    pub fn put(&mut self, pattern: &str, handler: impl Handler) -> &mut Self {
        self.route(Method::PUT, pattern, handler)
    }

    /// Registers a `PATCH` route.
    pub fn patch(&mut self, pattern: &str, handler: impl Handler) -> &mut Self {
        self.route(Method::PATCH, pattern, handler)
    }

    /// Registers a `DELETE` route.
    pub fn delete(&mut self, pattern: &str, handler: impl Handler) -> &mut Self {
        self.route(Method::DELETE, pattern, handler)
    }

    /// Opens a nested group under this group's prefix.
    pub fn group(&mut self, prefix: &str) -> Group<'_> {
        let index = self.slide.add_group(Some(self.index), prefix);
        Group {
            slide: &mut *self.slide,
            index,
        }
    }

    /// The full path prefix of this group.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.slide.groups[self.index].prefix
    }
}

impl fmt::Debug for Group<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Group")
            .field("prefix", &self.prefix())
            .field("middleware", &self.slide.groups[self.index].middleware.len())
            .finish()
    }
}

struct FrozenRoute {
    pattern: Arc<RoutePattern>,
    chain: Arc<Chain>,
}

/// An immutable, routable application.
pub struct App {
    router: Router,
    routes: Vec<FrozenRoute>,
    not_found: Arc<Chain>,
    middleware: Arc<[BoxedHandler]>,
    config: Arc<AppConfig>,
    unmatched_pattern: Arc<RoutePattern>,
}

impl App {
    /// Number of registered routes, replaced ones included.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Settings shared with every request context.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Builds the request context for `request` without running it.
    ///
    /// Unmatched requests get a chain of the application middleware
    /// followed by a 404 or 405 responder. The 404 chain is built once; the
    /// 405 chain carries the path's `Allow` value and is built per request.
    #[must_use]
    pub fn context(&self, request: Request<Bytes>) -> Ctx {
        let method = request.method().clone();
        let exchange = Exchange::new(request);

        if let Some(found) = self.router.match_route(&method, exchange.path()) {
            let route = &self.routes[found.route.index()];
            return Ctx::new(
                exchange,
                Arc::clone(&route.pattern),
                Some(Arc::clone(&route.chain)),
                Arc::clone(&self.config),
            );
        }

        let chain = match self.router.match_path(exchange.path()) {
            Some(methods) => {
                let responder = Unmatched::MethodNotAllowed {
                    allow: allow_header(methods.allowed_methods()),
                };
                Arc::new(Chain::new(&self.middleware, &[], boxed(responder)))
            }
            None => Arc::clone(&self.not_found),
        };

        Ctx::new(
            exchange,
            Arc::clone(&self.unmatched_pattern),
            Some(chain),
            Arc::clone(&self.config),
        )
    }

    /// Routes and runs one request, returning the response to send.
    ///
    /// An error escaping the chain is written as the JSON error envelope.
    pub async fn handle(&self, request: Request<Bytes>) -> Response<SlideBody> {
        let head_only = *request.method() == Method::HEAD;
        let mut ctx = self.context(request);

        if let Err(err) = ctx.next().await {
            if err.status_code().is_server_error() {
                error!(error = %err, code = err.code(), path = %ctx.path(), "unhandled error");
            }
            let expose = self.config.expose_internal_errors();
            if let Err(write_err) = write_error(&mut ctx, &err, expose) {
                error!(error = %write_err, "failed to write error response");
                return fallback_error();
            }
        }

        into_http_response(ctx.into_exchange().into_response(), head_only).await
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("routes", &self.routes.len())
            .field("middleware", &self.middleware.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Builds the per-request settings from a loaded configuration.
#[must_use]
pub fn app_config(config: &SlideConfig) -> AppConfig {
    AppConfig::new()
        .with_expose_internal_errors(config.server.expose_internal_errors)
        .with_upload_dir(config.uploads.dir.clone())
        .with_max_upload_bytes(config.uploads.max_file_bytes)
}

/// Terminal entry for requests no route matched.
enum Unmatched {
    NotFound,
    MethodNotAllowed { allow: HeaderValue },
}

impl Handler for Unmatched {
    fn call<'a>(&'a self, ctx: &'a mut Ctx) -> BoxFuture<'a, SlideResult<()>> {
        Box::pin(async move {
            let (status, code) = match self {
                Self::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                Self::MethodNotAllowed { allow } => {
                    ctx.set_header(header::ALLOW, allow.clone());
                    (StatusCode::METHOD_NOT_ALLOWED, "METHOD_NOT_ALLOWED")
                }
            };

            let envelope = ErrorEnvelope {
                error: ErrorDetail {
                    code: code.to_string(),
                    message: format!("no route for {} {}", ctx.method(), ctx.path()),
                    request_id: request_id(ctx).map(|id| id.to_string()),
                    details: None,
                },
            };
            ctx.json(status, &envelope)
        })
    }

    fn name(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::MethodNotAllowed { .. } => "method_not_allowed",
        }
    }
}

fn allow_header<'a>(methods: impl Iterator<Item = &'a Method>) -> HeaderValue {
    let mut names: Vec<&str> = methods.map(Method::as_str).collect();
    if names.contains(&"GET") && !names.contains(&"HEAD") {
        names.push("HEAD");
    }
    HeaderValue::from_str(&names.join(", ")).unwrap_or_else(|_| HeaderValue::from_static(""))
}

fn fallback_error() -> Response<SlideBody> {
    let mut response = Response::new(crate::body::empty());
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
}

/// Joins a group prefix and a route pattern into one absolute pattern.
fn join_paths(prefix: &str, path: &str) -> String {
    let mut joined = String::from("/");
    for part in [prefix.trim_matches('/'), path.trim_start_matches('/')] {
        if part.is_empty() {
            continue;
        }
        if !joined.ends_with('/') {
            joined.push('/');
        }
        joined.push_str(part);
    }
    joined
}
