//! The per-request context.
//!
//! A [`Ctx`] is created for every routed request and handed to each entry of
//! the route's chain in turn. It owns the [`Exchange`] for the duration of
//! the request, knows the route pattern that matched, and carries the
//! continuation cursor that drives the chain.
//!
//! # Continuation
//!
//! An entry continues the chain by awaiting [`Ctx::next`]. Entries run in
//! order (application middleware, group middleware, handler) and each runs
//! at most once. An entry that returns without calling `next` ends the
//! request with whatever response it has written. Calling `next` twice from
//! the same entry, or at all from the handler, is reported as
//! [`SlideError::ContinuationMisuse`] and runs nothing.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use http::header::{self, AsHeaderName, HeaderValue, IntoHeaderName};
use http::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use slide_router::{Params, RoutePattern};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::chain::{Chain, ChainState};
use crate::codec::{Codec, Json};
use crate::config::AppConfig;
use crate::content_type;
use crate::error::{SlideError, SlideResult};
use crate::exchange::{Exchange, FormFile, ResponseBody};
use crate::query;
use crate::validate::Validate;

/// Per-request context.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use bytes::Bytes;
/// use slide_core::{AppConfig, Ctx, Exchange};
/// use slide_router::RoutePattern;
///
/// let request = http::Request::get("/auth/madhuri/32?key=test")
///     .body(Bytes::new())
///     .unwrap();
/// let ctx = Ctx::new(
///     Exchange::new(request),
///     Arc::new(RoutePattern::parse("/auth/:name/:age")),
///     None,
///     Arc::new(AppConfig::new()),
/// );
///
/// assert_eq!(ctx.param("name"), "madhuri");
/// assert_eq!(ctx.param("missing"), "");
/// assert_eq!(ctx.query_param("key"), "test");
/// ```
pub struct Ctx {
    exchange: Exchange,
    config: Arc<AppConfig>,
    pattern: Arc<RoutePattern>,
    raw_query: String,
    chain: Option<Arc<Chain>>,
    /// Number of chain entries started so far.
    cursor: usize,
    /// Indices of the entries currently running, outermost first.
    frames: Vec<usize>,
    extensions: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Ctx {
    /// Creates a context for a routed request.
    ///
    /// `chain` is the route's chain; `None` means there is nothing to
    /// continue to.
    #[must_use]
    pub fn new(
        exchange: Exchange,
        pattern: Arc<RoutePattern>,
        chain: Option<Arc<Chain>>,
        config: Arc<AppConfig>,
    ) -> Self {
        let raw_query = exchange.raw_query().to_string();
        Self {
            exchange,
            config,
            pattern,
            raw_query,
            chain,
            cursor: 0,
            frames: Vec::new(),
            extensions: HashMap::new(),
        }
    }

    /// Ends the request and returns the exchange with the written response.
    #[must_use]
    pub fn into_exchange(self) -> Exchange {
        self.exchange
    }

    /// Returns the exchange.
    #[must_use]
    pub fn exchange(&self) -> &Exchange {
        &self.exchange
    }

    /// Returns the exchange for modification.
    pub fn exchange_mut(&mut self) -> &mut Exchange {
        &mut self.exchange
    }

    /// Returns the shared application configuration.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Returns the route pattern that matched this request.
    #[must_use]
    pub fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    // ------------------------------------------------------------------
    // Chain
    // ------------------------------------------------------------------

    /// Runs the next entry of the route chain and returns its result.
    ///
    /// Returns `Ok(())` without running anything when no chain is installed.
    pub async fn next(&mut self) -> SlideResult<()> {
        let Some(chain) = self.chain.clone() else {
            return Ok(());
        };

        let caller = self.frames.last().copied();
        let expected = caller.map_or(0, |index| index + 1);

        if self.cursor != expected {
            let index = caller.unwrap_or(self.cursor);
            warn!(index, path = %self.path(), "continuation invoked more than once");
            return Err(SlideError::ContinuationMisuse { index });
        }

        let Some(entry) = chain.get(expected).cloned() else {
            let index = caller.unwrap_or(expected);
            warn!(index, path = %self.path(), "continuation invoked by the route handler");
            return Err(SlideError::ContinuationMisuse { index });
        };

        debug!(index = expected, entry = entry.name(), "dispatching chain entry");

        self.cursor = expected + 1;
        self.frames.push(expected);
        let result = entry.call(self).await;
        self.frames.pop();
        result
    }

    /// Returns where this request is in its chain.
    #[must_use]
    pub fn chain_state(&self) -> ChainState {
        match (&self.chain, self.frames.last()) {
            (Some(chain), Some(&index)) => chain.position(index),
            _ if self.cursor == 0 => ChainState::BeforeChain,
            _ => ChainState::Done,
        }
    }

    /// Number of application middleware entries started.
    #[must_use]
    pub fn app_cursor(&self) -> usize {
        self.chain
            .as_ref()
            .map_or(0, |chain| self.cursor.min(chain.app_len()))
    }

    /// Number of group middleware entries started.
    #[must_use]
    pub fn group_cursor(&self) -> usize {
        self.chain.as_ref().map_or(0, |chain| {
            self.cursor
                .saturating_sub(chain.app_len())
                .min(chain.group_len())
        })
    }

    // ------------------------------------------------------------------
    // Request data
    // ------------------------------------------------------------------

    /// Returns the request method.
    #[must_use]
    pub fn method(&self) -> &Method {
        self.exchange.method()
    }

    /// Returns the request path.
    #[must_use]
    pub fn path(&self) -> &str {
        self.exchange.path()
    }

    /// Returns the request body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        self.exchange.body()
    }

    /// Returns a request header as text, if present and valid UTF-8.
    #[must_use]
    pub fn header<K: AsHeaderName>(&self, name: K) -> Option<&str> {
        self.exchange
            .request_headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
    }

    /// Returns the path parameter `name`, or `""` if the route has none.
    ///
    /// For the pattern `/name/:name` and the path `/name/slide`,
    /// `ctx.param("name")` is `"slide"`.
    #[must_use]
    pub fn param(&self, name: &str) -> &str {
        self.pattern
            .param(self.exchange.path(), name)
            .unwrap_or_default()
    }

    /// Returns every path parameter.
    #[must_use]
    pub fn params(&self) -> Params {
        self.pattern.params(self.exchange.path())
    }

    /// Returns the query suffix as received, without the `?`.
    #[must_use]
    pub fn raw_query(&self) -> &str {
        &self.raw_query
    }

    /// Returns the raw value of query key `key`, or `""` if absent.
    #[must_use]
    pub fn query_param(&self, key: &str) -> &str {
        query::query_param(&self.raw_query, key).unwrap_or_default()
    }

    /// Returns every query parameter with raw values.
    #[must_use]
    pub fn query_params(&self) -> Params {
        query::query_params(&self.raw_query)
    }

    /// Deserializes the query string into `T`, percent-decoding values.
    pub fn query<T: DeserializeOwned>(&self) -> SlideResult<T> {
        serde_urlencoded::from_str(&self.raw_query).map_err(SlideError::decode)
    }

    /// Decodes the JSON request body into `T` and runs the configured
    /// validator on it.
    pub fn bind<T: DeserializeOwned + Validate>(&self) -> SlideResult<T> {
        self.bind_with::<Json, T>()
    }

    /// Decodes the request body with codec `C` and runs the configured
    /// validator on it.
    pub fn bind_with<C: Codec, T: DeserializeOwned + Validate>(&self) -> SlideResult<T> {
        let value: T = C::decode(self.exchange.body())?;
        if let Some(validator) = self.config.validator() {
            validator.validate(&value)?;
        }
        Ok(value)
    }

    /// Reads the multipart file field `field`.
    pub async fn form_file(&self, field: &str) -> SlideResult<FormFile> {
        self.exchange.form_file(field).await
    }

    /// Copies the multipart file field `field` to `dest`, returning the
    /// number of bytes written.
    ///
    /// The field is streamed chunk by chunk. The destination is flushed and
    /// closed before returning, on success and on failure. A relative `dest`
    /// is placed under the configured upload directory, if any. A file over
    /// the configured upload limit is removed and reported as a form error.
    pub async fn upload_file(&self, dest: impl AsRef<Path>, field: &str) -> SlideResult<u64> {
        let dest = self.config.upload_path(dest.as_ref());
        let dest = dest.as_path();
        let limit = self.config.max_upload_bytes();
        let mut multipart = self.exchange.multipart(field)?;

        while let Some(mut part) = multipart
            .next_field()
            .await
            .map_err(|e| SlideError::form_file(field, e))?
        {
            if part.name() != Some(field) {
                continue;
            }

            let mut out = tokio::fs::File::create(dest)
                .await
                .map_err(|e| SlideError::io(dest, e))?;

            let mut written = 0u64;
            while let Some(chunk) = part
                .chunk()
                .await
                .map_err(|e| SlideError::form_file(field, e))?
            {
                out.write_all(&chunk)
                    .await
                    .map_err(|e| SlideError::io(dest, e))?;
                written += chunk.len() as u64;
                if let Some(max) = limit.filter(|max| written > *max) {
                    drop(out);
                    if let Err(err) = tokio::fs::remove_file(dest).await {
                        warn!(
                            path = %dest.display(),
                            error = %err,
                            "failed to remove oversized upload"
                        );
                    }
                    return Err(SlideError::form_file(
                        field,
                        format!("file exceeds {max} bytes"),
                    ));
                }
            }
            out.flush().await.map_err(|e| SlideError::io(dest, e))?;

            debug!(field, dest = %dest.display(), bytes = written, "stored uploaded file");
            return Ok(written);
        }

        Err(SlideError::form_file(field, "no such field"))
    }

    // ------------------------------------------------------------------
    // Response writing
    // ------------------------------------------------------------------

    /// Returns the response status written so far.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.exchange.status()
    }

    /// Sets a response header.
    pub fn set_header<K: IntoHeaderName>(&mut self, name: K, value: HeaderValue) {
        self.exchange.set_header(name, value);
    }

    /// Sends `payload` as JSON with `status`.
    ///
    /// The content type and status are set before encoding. If encoding
    /// fails no body is written, but the status and content type stay set.
    pub fn json<T: Serialize + ?Sized>(&mut self, status: StatusCode, payload: &T) -> SlideResult<()> {
        self.encode_with::<Json, T>(status, payload)
    }

    /// Sends `payload` encoded with codec `C`.
    pub fn encode_with<C: Codec, T: Serialize + ?Sized>(
        &mut self,
        status: StatusCode,
        payload: &T,
    ) -> SlideResult<()> {
        self.exchange
            .set_header(header::CONTENT_TYPE, HeaderValue::from_static(C::CONTENT_TYPE));
        self.exchange.set_status(status);
        let body = C::encode(payload)?;
        self.exchange.set_body(body);
        Ok(())
    }

    /// Sends a text body.
    ///
    /// Defaults the content type to `text/plain` unless one is already set.
    pub fn send(&mut self, status: StatusCode, text: impl Into<String>) -> SlideResult<()> {
        if !self.exchange.has_header(&header::CONTENT_TYPE) {
            self.exchange.set_header(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; charset=utf-8"),
            );
        }
        self.exchange.set_status(status);
        self.exchange.set_body(text.into());
        Ok(())
    }

    /// Sends only a status code.
    pub fn send_status(&mut self, status: StatusCode) -> SlideResult<()> {
        self.exchange.set_status(status);
        Ok(())
    }

    /// Redirects to `url`. Picking a 3xx status is up to the caller.
    pub fn redirect(&mut self, status: StatusCode, url: &str) -> SlideResult<()> {
        self.exchange.redirect(status, url)
    }

    /// Sends the file at `path` as a download.
    ///
    /// `display_name` becomes the suggested file name in the
    /// `content-disposition` header.
    pub async fn send_attachment(
        &mut self,
        path: impl AsRef<Path>,
        display_name: Option<&str>,
    ) -> SlideResult<()> {
        let path = path.as_ref();
        let content = tokio::fs::read(path)
            .await
            .map_err(|e| SlideError::io(path, e))?;
        let mime = content_type::infer(path).await?;

        let disposition = attachment_disposition(display_name);
        let disposition = HeaderValue::from_bytes(disposition.as_bytes()).map_err(|e| {
            SlideError::internal_with_source("invalid attachment file name", e)
        })?;

        self.exchange
            .set_header(header::CONTENT_TYPE, HeaderValue::from_static(mime));
        self.exchange
            .set_header(header::CONTENT_DISPOSITION, disposition);
        self.exchange.set_body(content);
        Ok(())
    }

    /// Streams the file at `path` as the response body.
    pub async fn serve_file(&mut self, path: impl AsRef<Path>) -> SlideResult<()> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| SlideError::io(path, e))?;
        if !metadata.is_file() {
            return Err(SlideError::io(
                path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "not a regular file"),
            ));
        }

        let mime = content_type::infer(path).await?;
        self.exchange
            .set_header(header::CONTENT_TYPE, HeaderValue::from_static(mime));
        self.exchange
            .set_header(header::CONTENT_LENGTH, HeaderValue::from(metadata.len()));
        self.exchange.set_file(path);
        Ok(())
    }

    /// Returns the response body written so far.
    #[must_use]
    pub fn response_body(&self) -> &ResponseBody {
        self.exchange.response_body()
    }

    // ------------------------------------------------------------------
    // Extensions
    // ------------------------------------------------------------------

    /// Stores a typed value for later chain entries.
    pub fn set_extension<T: Send + Sync + 'static>(&mut self, value: T) {
        self.extensions.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Returns a stored value.
    #[must_use]
    pub fn extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref())
    }

    /// Removes and returns a stored value.
    pub fn remove_extension<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.extensions
            .remove(&TypeId::of::<T>())
            .and_then(|value| value.downcast().ok())
            .map(|value| *value)
    }

    /// Returns true if a value of type `T` is stored.
    #[must_use]
    pub fn has_extension<T: Send + Sync + 'static>(&self) -> bool {
        self.extensions.contains_key(&TypeId::of::<T>())
    }
}

impl fmt::Debug for Ctx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ctx")
            .field("method", self.method())
            .field("path", &self.path())
            .field("pattern", &self.pattern.as_str())
            .field("raw_query", &self.raw_query)
            .field("state", &self.chain_state())
            .finish_non_exhaustive()
    }
}

/// Builds a `content-disposition` value for a download.
fn attachment_disposition(display_name: Option<&str>) -> String {
    match display_name.filter(|name| !name.is_empty()) {
        None => "attachment".to_string(),
        Some(name) => {
            let escaped: String = name
                .chars()
                .filter(|c| !c.is_control())
                .flat_map(|c| match c {
                    '"' | '\\' => vec!['\\', c],
                    _ => vec![c],
                })
                .collect();
            format!("attachment; filename=\"{escaped}\"")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::exchange::tests::multipart_body;
    use crate::handler::{boxed, BoxFuture};
    use crate::validate::RuleValidator;
    use serde::Deserialize;
    use std::io::Write;

    fn ctx_for(pattern: &str, uri: &str) -> Ctx {
        let request = http::Request::get(uri).body(Bytes::new()).unwrap();
        Ctx::new(
            Exchange::new(request),
            Arc::new(RoutePattern::parse(pattern)),
            None,
            Arc::new(AppConfig::new()),
        )
    }

    fn ctx_with_body(body: &'static str, config: AppConfig) -> Ctx {
        let request = http::Request::post("/users")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Bytes::from_static(body.as_bytes()))
            .unwrap();
        Ctx::new(
            Exchange::new(request),
            Arc::new(RoutePattern::parse("/users")),
            None,
            Arc::new(config),
        )
    }

    #[derive(Debug, Deserialize, Serialize, PartialEq)]
    struct User {
        name: String,
        age: i32,
    }

    impl Validate for User {
        fn validate(&self) -> Result<(), ValidationError> {
            if self.age < 0 {
                return Err(ValidationError::new("invalid user").with_field("age", "must be >= 0"));
            }
            Ok(())
        }
    }

    #[test]
    fn test_param() {
        let ctx = ctx_for("/name/:name", "/name/slide");
        assert_eq!(ctx.param("name"), "slide");
        assert_eq!(ctx.param("other"), "");
    }

    #[test]
    fn test_param_is_percent_decoded() {
        let ctx = ctx_for("/name/:name", "/name/J%C3%BCrgen%20X");
        assert_eq!(ctx.param("name"), "Jürgen X");
        assert_eq!(ctx.params().get("name"), Some("Jürgen X"));
        assert_eq!(ctx.path(), "/name/Jürgen X");
    }

    #[test]
    fn test_params() {
        let ctx = ctx_for("/auth/:name/:age", "/auth/madhuri/32");
        let params = ctx.params();
        assert_eq!(params.len(), 2);
        assert_eq!(params.get("name"), Some("madhuri"));
        assert_eq!(params.get("age"), Some("32"));
    }

    #[test]
    fn test_query_params() {
        let ctx = ctx_for("/hello", "/hello?key=test&value=bbp");
        assert_eq!(ctx.raw_query(), "key=test&value=bbp");
        assert_eq!(ctx.query_param("key"), "test");
        assert_eq!(ctx.query_param("nope"), "");

        let all = ctx.query_params();
        assert_eq!(all.get("key"), Some("test"));
        assert_eq!(all.get("value"), Some("bbp"));
    }

    #[test]
    fn test_empty_query() {
        let ctx = ctx_for("/hello", "/hello");
        assert!(ctx.query_params().is_empty());
        assert_eq!(ctx.query_param("anything"), "");
    }

    #[test]
    fn test_typed_query() {
        #[derive(Deserialize)]
        struct Search {
            q: String,
            page: u32,
        }

        let ctx = ctx_for("/search", "/search?q=hello%20world&page=2");
        let search: Search = ctx.query().unwrap();
        assert_eq!(search.q, "hello world");
        assert_eq!(search.page, 2);

        let bad = ctx_for("/search", "/search?page=two");
        assert!(matches!(bad.query::<Search>(), Err(SlideError::Decode(_))));
    }

    #[test]
    fn test_json_response() {
        let mut ctx = ctx_for("/", "/");
        ctx.json(
            StatusCode::CREATED,
            &User {
                name: "madhuri".into(),
                age: 32,
            },
        )
        .unwrap();

        let response = ctx.into_exchange().into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(
            response.body().as_bytes().map(|b| &b[..]),
            Some(&br#"{"name":"madhuri","age":32}"#[..])
        );
    }

    #[test]
    fn test_json_encode_failure_writes_no_body() {
        let mut map = std::collections::HashMap::new();
        map.insert(vec![1u8], 1);

        let mut ctx = ctx_for("/", "/");
        let err = ctx.json(StatusCode::OK, &map).unwrap_err();
        assert!(matches!(err, SlideError::Encode(_)));
        assert!(ctx.response_body().is_empty());
    }

    #[test]
    fn test_send_and_status() {
        let mut ctx = ctx_for("/", "/");
        ctx.send(StatusCode::ACCEPTED, "queued").unwrap();
        assert_eq!(ctx.status(), StatusCode::ACCEPTED);
        assert_eq!(
            ctx.exchange().headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );

        let mut ctx = ctx_for("/", "/");
        ctx.send_status(StatusCode::NO_CONTENT).unwrap();
        assert_eq!(ctx.status(), StatusCode::NO_CONTENT);
        assert!(ctx.response_body().is_empty());
    }

    #[test]
    fn test_redirect() {
        let mut ctx = ctx_for("/old", "/old");
        ctx.redirect(StatusCode::MOVED_PERMANENTLY, "/new").unwrap();
        assert_eq!(ctx.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(ctx.exchange().headers()[header::LOCATION], "/new");
    }

    #[test]
    fn test_bind_without_validator() {
        let ctx = ctx_with_body(r#"{"name":"a","age":-1}"#, AppConfig::new());
        let user: User = ctx.bind().unwrap();
        assert_eq!(user.age, -1);
    }

    #[test]
    fn test_bind_with_validator() {
        let config = AppConfig::new().with_validator(RuleValidator);

        let ctx = ctx_with_body(r#"{"name":"a","age":3}"#, config.clone());
        assert_eq!(ctx.bind::<User>().unwrap().age, 3);

        let ctx = ctx_with_body(r#"{"name":"a","age":-1}"#, config.clone());
        let err = ctx.bind::<User>().unwrap_err();
        assert!(matches!(err, SlideError::Validation(ref v) if v.fields.contains_key("age")));

        let ctx = ctx_with_body(r#"{"name":"a""#, config);
        assert!(matches!(ctx.bind::<User>(), Err(SlideError::Decode(_))));
    }

    #[tokio::test]
    async fn test_send_attachment() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        file.write_all(b"report body").unwrap();

        let mut ctx = ctx_for("/download", "/download");
        ctx.send_attachment(file.path(), Some("report.txt"))
            .await
            .unwrap();

        let headers = ctx.exchange().headers();
        assert_eq!(headers[header::CONTENT_TYPE], "text/plain; charset=utf-8");
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=\"report.txt\""
        );
        assert_eq!(
            ctx.response_body().as_bytes().map(|b| &b[..]),
            Some(&b"report body"[..])
        );
    }

    #[tokio::test]
    async fn test_send_attachment_without_name() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0xff, 0x00, 0xfe]).unwrap();

        let mut ctx = ctx_for("/download", "/download");
        ctx.send_attachment(file.path(), None).await.unwrap();

        let headers = ctx.exchange().headers();
        assert_eq!(headers[header::CONTENT_DISPOSITION], "attachment");
        assert_eq!(headers[header::CONTENT_TYPE], "application/octet-stream");
    }

    #[tokio::test]
    async fn test_send_attachment_missing_file() {
        let mut ctx = ctx_for("/download", "/download");
        let err = ctx
            .send_attachment("/definitely/not/here.txt", None)
            .await
            .unwrap_err();
        assert!(matches!(err, SlideError::Io { .. }));
        assert!(ctx.response_body().is_empty());
    }

    #[test]
    fn test_attachment_disposition_escapes() {
        assert_eq!(attachment_disposition(None), "attachment");
        assert_eq!(attachment_disposition(Some("")), "attachment");
        assert_eq!(
            attachment_disposition(Some("a\"b\n.txt")),
            "attachment; filename=\"a\\\"b.txt\""
        );
    }

    #[tokio::test]
    async fn test_serve_file() {
        let mut file = tempfile::Builder::new().suffix(".html").tempfile().unwrap();
        file.write_all(b"<html></html>").unwrap();

        let mut ctx = ctx_for("/", "/");
        ctx.serve_file(file.path()).await.unwrap();

        assert_eq!(
            ctx.exchange().headers()[header::CONTENT_TYPE],
            "text/html; charset=utf-8"
        );
        assert_eq!(ctx.exchange().headers()[header::CONTENT_LENGTH], "13");
        assert_eq!(ctx.response_body(), &ResponseBody::File(file.path().to_path_buf()));
    }

    #[tokio::test]
    async fn test_serve_missing_file() {
        let mut ctx = ctx_for("/", "/");
        let err = ctx.serve_file("/no/such/file.bin").await.unwrap_err();
        assert!(matches!(err, SlideError::Io { .. }));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_upload_file() {
        let boundary = "----slide";
        let body = multipart_body(boundary, &[("avatar", Some("me.png"), b"pixels")]);
        let request = http::Request::post("/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Bytes::from(body))
            .unwrap();
        let ctx = Ctx::new(
            Exchange::new(request),
            Arc::new(RoutePattern::parse("/upload")),
            None,
            Arc::new(AppConfig::new()),
        );

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("stored.png");

        assert_eq!(ctx.upload_file(&dest, "avatar").await.unwrap(), 6);
        assert_eq!(std::fs::read(&dest).unwrap(), b"pixels");

        let err = ctx.upload_file(&dest, "missing").await.unwrap_err();
        assert!(matches!(err, SlideError::FormFile { .. }));
    }

    #[tokio::test]
    async fn test_upload_file_respects_dir_and_limit() {
        let boundary = "----slide";
        let body = multipart_body(boundary, &[("doc", Some("a.txt"), b"0123456789")]);
        let request = || {
            http::Request::post("/upload")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Bytes::from(body.clone()))
                .unwrap()
        };
        let dir = tempfile::tempdir().unwrap();

        let ctx = Ctx::new(
            Exchange::new(request()),
            Arc::new(RoutePattern::parse("/upload")),
            None,
            Arc::new(AppConfig::new().with_upload_dir(dir.path())),
        );
        assert_eq!(ctx.upload_file("a.txt", "doc").await.unwrap(), 10);
        assert_eq!(std::fs::read(dir.path().join("a.txt")).unwrap(), b"0123456789");

        let ctx = Ctx::new(
            Exchange::new(request()),
            Arc::new(RoutePattern::parse("/upload")),
            None,
            Arc::new(
                AppConfig::new()
                    .with_upload_dir(dir.path())
                    .with_max_upload_bytes(Some(4)),
            ),
        );
        let err = ctx.upload_file("b.txt", "doc").await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(!dir.path().join("b.txt").exists());
    }

    #[test]
    fn test_extensions() {
        #[derive(Debug, PartialEq)]
        struct Tenant(&'static str);

        let mut ctx = ctx_for("/", "/");
        assert!(!ctx.has_extension::<Tenant>());

        ctx.set_extension(Tenant("acme"));
        assert_eq!(ctx.extension::<Tenant>(), Some(&Tenant("acme")));
        assert_eq!(ctx.remove_extension::<Tenant>(), Some(Tenant("acme")));
        assert!(ctx.extension::<Tenant>().is_none());
    }

    #[tokio::test]
    async fn test_next_without_chain_is_noop() {
        let mut ctx = ctx_for("/", "/");
        assert!(ctx.next().await.is_ok());
        assert_eq!(ctx.chain_state(), ChainState::BeforeChain);
        assert_eq!(ctx.app_cursor(), 0);
        assert_eq!(ctx.group_cursor(), 0);
    }

    fn record_state(ctx: &mut Ctx) -> BoxFuture<'_, SlideResult<()>> {
        Box::pin(async move {
            let state = ctx.chain_state();
            let cursors = (ctx.app_cursor(), ctx.group_cursor());
            ctx.set_extension((state, cursors));
            Ok(())
        })
    }

    fn pass(ctx: &mut Ctx) -> BoxFuture<'_, SlideResult<()>> {
        Box::pin(async move { ctx.next().await })
    }

    #[tokio::test]
    async fn test_chain_state_and_cursors() {
        let chain = Chain::new(&[boxed(pass)], &[boxed(pass)], boxed(record_state));
        let request = http::Request::get("/").body(Bytes::new()).unwrap();
        let mut ctx = Ctx::new(
            Exchange::new(request),
            Arc::new(RoutePattern::parse("/")),
            Some(Arc::new(chain)),
            Arc::new(AppConfig::new()),
        );

        ctx.next().await.unwrap();

        assert_eq!(
            ctx.extension::<(ChainState, (usize, usize))>(),
            Some(&(ChainState::Handler, (1, 1)))
        );
        assert_eq!(ctx.chain_state(), ChainState::Done);
        assert!(matches!(
            ctx.next().await,
            Err(SlideError::ContinuationMisuse { .. })
        ));
    }
}
