//! Wire format codecs.
//!
//! [`Ctx::json`](crate::Ctx::json) and [`Ctx::bind`](crate::Ctx::bind) use
//! [`Json`]. Other formats plug in through
//! [`Ctx::encode_with`](crate::Ctx::encode_with) and
//! [`Ctx::bind_with`](crate::Ctx::bind_with) by implementing [`Codec`].

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{SlideError, SlideResult};

/// Encodes and decodes payloads in one wire format.
pub trait Codec {
    /// Value of the `content-type` header for encoded payloads.
    const CONTENT_TYPE: &'static str;

    /// Encodes a value.
    fn encode<T: Serialize + ?Sized>(value: &T) -> SlideResult<Bytes>;

    /// Decodes a value.
    fn decode<T: DeserializeOwned>(bytes: &[u8]) -> SlideResult<T>;
}

/// JSON via `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Json;

impl Codec for Json {
    const CONTENT_TYPE: &'static str = "application/json";

    fn encode<T: Serialize + ?Sized>(value: &T) -> SlideResult<Bytes> {
        serde_json::to_vec(value)
            .map(Bytes::from)
            .map_err(SlideError::encode)
    }

    fn decode<T: DeserializeOwned>(bytes: &[u8]) -> SlideResult<T> {
        serde_json::from_slice(bytes).map_err(SlideError::decode)
    }
}

/// `application/x-www-form-urlencoded` via `serde_urlencoded`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Form;

impl Codec for Form {
    const CONTENT_TYPE: &'static str = "application/x-www-form-urlencoded";

    fn encode<T: Serialize + ?Sized>(value: &T) -> SlideResult<Bytes> {
        serde_urlencoded::to_string(value)
            .map(Bytes::from)
            .map_err(SlideError::encode)
    }

    fn decode<T: DeserializeOwned>(bytes: &[u8]) -> SlideResult<T> {
        serde_urlencoded::from_bytes(bytes).map_err(SlideError::decode)
    }
}
