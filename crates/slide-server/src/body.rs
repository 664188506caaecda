//! Conversion of context responses into hyper response bodies.
//!
//! In-memory bodies are sent as a single frame. File bodies are opened when
//! the response is sent and streamed in chunks, so large downloads never sit
//! in memory.

use std::convert::Infallible;
use std::io;

use bytes::Bytes;
use futures_util::TryStreamExt;
use http::{header, HeaderValue, Response, StatusCode};
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full, StreamBody};
use hyper::body::Frame;
use slide_core::ResponseBody;
use tokio_util::io::ReaderStream;
use tracing::error;

/// Body type of every response the server sends.
pub type SlideBody = UnsyncBoxBody<Bytes, io::Error>;

/// A body with no content.
#[must_use]
pub fn empty() -> SlideBody {
    Empty::<Bytes>::new()
        .map_err(|never: Infallible| match never {})
        .boxed_unsync()
}

/// A body holding `bytes` in memory.
#[must_use]
pub fn full(bytes: impl Into<Bytes>) -> SlideBody {
    Full::new(bytes.into())
        .map_err(|never: Infallible| match never {})
        .boxed_unsync()
}

/// Converts a context response into one hyper can send.
///
/// With `head_only` the body is dropped but headers are kept, and an
/// in-memory body still reports its `content-length`. A file that disappeared since the handler
/// checked it becomes an empty 500 response.
pub async fn into_http_response(
    response: Response<ResponseBody>,
    head_only: bool,
) -> Response<SlideBody> {
    let (mut parts, body) = response.into_parts();

    if head_only {
        if let ResponseBody::Bytes(bytes) = &body {
            parts
                .headers
                .entry(header::CONTENT_LENGTH)
                .or_insert_with(|| HeaderValue::from(bytes.len()));
        }
        return Response::from_parts(parts, empty());
    }

    let body = match body {
        ResponseBody::Empty => empty(),
        ResponseBody::Bytes(bytes) => full(bytes),
        ResponseBody::File(path) => match tokio::fs::File::open(&path).await {
            Ok(file) => {
                let stream = ReaderStream::new(file).map_ok(Frame::data);
                StreamBody::new(stream).boxed_unsync()
            }
            Err(err) => {
                error!(path = %path.display(), error = %err, "failed to open response file");
                parts.status = StatusCode::INTERNAL_SERVER_ERROR;
                parts.headers.remove(header::CONTENT_LENGTH);
                parts.headers.remove(header::CONTENT_TYPE);
                parts.headers.remove(header::CONTENT_DISPOSITION);
                empty()
            }
        },
    };

    Response::from_parts(parts, body)
}
