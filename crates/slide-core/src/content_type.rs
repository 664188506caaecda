//! Content type inference for files.
//!
//! The file extension is consulted first. Files with an unknown or missing
//! extension are sniffed: the first [`SNIFF_LEN`] bytes are matched against a
//! small set of magic numbers, then treated as text if they are valid UTF-8
//! and as `application/octet-stream` otherwise.

use std::path::Path;

use tokio::io::AsyncReadExt;

use crate::error::{SlideError, SlideResult};

/// Number of leading bytes inspected when sniffing.
pub const SNIFF_LEN: usize = 512;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const OCTET_STREAM: &str = "application/octet-stream";

/// Infers the content type of the file at `path`.
///
/// Fails with [`SlideError::ContentType`] if sniffing is needed and the file
/// cannot be read. No fallback type is substituted on failure.
pub async fn infer(path: &Path) -> SlideResult<&'static str> {
    if let Some(mime) = from_extension(path) {
        return Ok(mime);
    }

    let file = tokio::fs::File::open(path)
        .await
        .map_err(|e| SlideError::content_type(path, e))?;

    let mut head = Vec::with_capacity(SNIFF_LEN);
    file.take(SNIFF_LEN as u64)
        .read_to_end(&mut head)
        .await
        .map_err(|e| SlideError::content_type(path, e))?;

    Ok(sniff(&head))
}

/// Maps a file extension to a content type.
#[must_use]
pub fn from_extension(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();

    let mime = match extension.as_str() {
        // Text
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "json" | "map" => "application/json",
        "xml" => "application/xml",
        "txt" => TEXT_PLAIN,
        "csv" => "text/csv; charset=utf-8",
        "md" => "text/markdown; charset=utf-8",

        // Images
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "ico" => "image/x-icon",

        // Fonts
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",

        // Documents and archives
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "gz" | "gzip" => "application/gzip",
        "tar" => "application/x-tar",

        // Media
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "mp4" => "video/mp4",
        "webm" => "video/webm",

        "wasm" => "application/wasm",

        _ => return None,
    };

    Some(mime)
}

/// Classifies leading file content.
#[must_use]
pub fn sniff(head: &[u8]) -> &'static str {
    const SIGNATURES: &[(&[u8], &str)] = &[
        (b"\x89PNG\r\n\x1a\n", "image/png"),
        (b"\xff\xd8\xff", "image/jpeg"),
        (b"GIF87a", "image/gif"),
        (b"GIF89a", "image/gif"),
        (b"%PDF-", "application/pdf"),
        (b"PK\x03\x04", "application/zip"),
        (b"\x1f\x8b\x08", "application/gzip"),
        (b"\0asm", "application/wasm"),
    ];

    let head = &head[..head.len().min(SNIFF_LEN)];

    if let Some((_, mime)) = SIGNATURES.iter().find(|(sig, _)| head.starts_with(sig)) {
        return *mime;
    }

    let start = head
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(head.len());
    let trimmed = &head[start..];
    if trimmed.starts_with(b"<!DOCTYPE html") || trimmed.starts_with(b"<html") {
        return "text/html; charset=utf-8";
    }

    match std::str::from_utf8(head) {
        Ok(_) => TEXT_PLAIN,
        // A multi-byte character cut at the sniff boundary is still text.
        Err(e) if e.error_len().is_none() && head.len() == SNIFF_LEN => TEXT_PLAIN,
        Err(_) => OCTET_STREAM,
    }
}
