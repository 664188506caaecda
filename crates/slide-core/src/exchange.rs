//! The transport exchange: one request and the response being built for it.
//!
//! [`Exchange`] is the narrow seam between the request context and the HTTP
//! engine. The server fills it from the incoming request and turns it back
//! into a response once the route chain has returned.

use std::io;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use http::header::{self, HeaderMap, HeaderName, HeaderValue, IntoHeaderName};
use http::{Method, Request, Response, StatusCode, Uri};

use crate::error::{SlideError, SlideResult};

/// Response body as written by the route chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ResponseBody {
    /// No body.
    #[default]
    Empty,
    /// An in-memory body.
    Bytes(Bytes),
    /// A file streamed from disk when the response is sent.
    File(PathBuf),
}

impl ResponseBody {
    /// Returns true if no body has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Returns the in-memory body, if any.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Self::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }
}

/// A file field read from a `multipart/form-data` request body.
#[derive(Debug, Clone)]
pub struct FormFile {
    /// The form field name.
    pub field: String,
    /// The client-supplied file name.
    pub file_name: Option<String>,
    /// The client-supplied content type.
    pub content_type: Option<String>,
    /// The file content.
    pub data: Bytes,
}

/// One request/response exchange.
#[derive(Debug)]
pub struct Exchange {
    request: Request<Bytes>,
    path: String,
    status: StatusCode,
    headers: HeaderMap,
    body: ResponseBody,
}

impl Exchange {
    /// Wraps a request whose body has already been collected.
    #[must_use]
    pub fn new(request: Request<Bytes>) -> Self {
        let path = decode_path(request.uri().path());
        Self {
            request,
            path,
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: ResponseBody::Empty,
        }
    }

    // ------------------------------------------------------------------
    // Request side
    // ------------------------------------------------------------------

    /// Returns the request.
    #[must_use]
    pub fn request(&self) -> &Request<Bytes> {
        &self.request
    }

    /// Returns the request method.
    #[must_use]
    pub fn method(&self) -> &Method {
        self.request.method()
    }

    /// Returns the request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        self.request.uri()
    }

    /// Returns the percent-decoded request path.
    ///
    /// Routing and path parameters both use this form, so `/name/J%C3%BCrgen`
    /// binds `Jürgen`.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the request path as received on the wire.
    #[must_use]
    pub fn raw_path(&self) -> &str {
        self.request.uri().path()
    }

    /// Returns the query suffix without the `?`, or `""`.
    #[must_use]
    pub fn raw_query(&self) -> &str {
        self.request.uri().query().unwrap_or_default()
    }

    /// Returns the request headers.
    #[must_use]
    pub fn request_headers(&self) -> &HeaderMap {
        self.request.headers()
    }

    /// Returns the request body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        self.request.body()
    }

    /// Opens the request body as a multipart form.
    ///
    /// Fails with [`SlideError::FormFile`] when the request is not
    /// `multipart/form-data` or carries no boundary.
    pub fn multipart(&self, field: &str) -> SlideResult<multer::Multipart<'static>> {
        let content_type = self
            .request_headers()
            .get(header::CONTENT_TYPE)
            .ok_or_else(|| SlideError::form_file(field, "missing content-type"))?
            .to_str()
            .map_err(|_| SlideError::form_file(field, "invalid UTF-8 in content-type"))?;

        let boundary = multer::parse_boundary(content_type)
            .map_err(|_| SlideError::form_file(field, "request is not multipart/form-data"))?;

        let body = self.body().clone();
        let stream = futures_util::stream::once(async move { Ok::<_, io::Error>(body) });

        Ok(multer::Multipart::new(stream, boundary))
    }

    /// Reads the file field `field` from a multipart request body.
    pub async fn form_file(&self, field: &str) -> SlideResult<FormFile> {
        let mut multipart = self.multipart(field)?;

        while let Some(part) = multipart
            .next_field()
            .await
            .map_err(|e| SlideError::form_file(field, e))?
        {
            if part.name() != Some(field) {
                continue;
            }

            let file_name = part.file_name().map(ToString::to_string);
            let content_type = part.content_type().map(ToString::to_string);
            let data = part
                .bytes()
                .await
                .map_err(|e| SlideError::form_file(field, e))?;

            return Ok(FormFile {
                field: field.to_string(),
                file_name,
                content_type,
                data,
            });
        }

        Err(SlideError::form_file(field, "no such field"))
    }

    // ------------------------------------------------------------------
    // Response side
    // ------------------------------------------------------------------

    /// Returns the response status.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Sets the response status.
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    /// Returns the response headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the response headers for modification.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Sets a response header, replacing any previous values.
    pub fn set_header<K: IntoHeaderName>(&mut self, name: K, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    /// Returns the response body.
    #[must_use]
    pub fn response_body(&self) -> &ResponseBody {
        &self.body
    }

    /// Sets an in-memory response body.
    pub fn set_body(&mut self, body: impl Into<Bytes>) {
        self.body = ResponseBody::Bytes(body.into());
    }

    /// Streams the file at `path` as the response body.
    pub fn set_file(&mut self, path: impl AsRef<Path>) {
        self.body = ResponseBody::File(path.as_ref().to_path_buf());
    }

    /// Removes the response body.
    pub fn clear_body(&mut self) {
        self.body = ResponseBody::Empty;
    }

    /// Sets `Location` and the status.
    pub fn redirect(&mut self, status: StatusCode, location: &str) -> SlideResult<()> {
        let value = HeaderValue::from_str(location).map_err(|e| {
            SlideError::internal_with_source(format!("invalid redirect location {location:?}"), e)
        })?;
        self.set_header(header::LOCATION, value);
        self.status = status;
        Ok(())
    }

    /// Resets status, headers and body, keeping the request.
    pub fn reset_response(&mut self) {
        self.status = StatusCode::OK;
        self.headers.clear();
        self.body = ResponseBody::Empty;
    }

    /// Converts the written response into an `http::Response`.
    #[must_use]
    pub fn into_response(self) -> Response<ResponseBody> {
        let mut response = Response::new(self.body);
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }

    /// Returns true if a response header with `name` is set.
    #[must_use]
    pub fn has_header(&self, name: &HeaderName) -> bool {
        self.headers.contains_key(name)
    }
}

/// Percent-decodes a request path; a path that does not decode to UTF-8 is
/// kept as received.
fn decode_path(raw: &str) -> String {
    match urlencoding::decode(raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => raw.to_string(),
    }
}

impl From<Request<Bytes>> for Exchange {
    fn from(request: Request<Bytes>) -> Self {
        Self::new(request)
    }
}
