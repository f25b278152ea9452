//! Non-destructive body capture.
//!
//! Bodies are buffered once; the caller gets a fresh `Body` over the same
//! bytes, so downstream consumers still see an intact stream.

use std::error::Error as StdError;

use axum::body::{Body, Bytes};
use axum::http::Method;
use axum::response::Response;
use http_body_util::LengthLimitError;
use serde_json::Value;

/// GET and HEAD bodies are never read.
pub fn reads_body(method: &Method) -> bool {
    method != Method::GET && method != Method::HEAD
}

/// Parse bytes as JSON; empty or invalid input is `null`.
pub fn parse_json(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).unwrap_or(Value::Null)
}

/// Response bodies: absent when empty, `null` when not JSON.
pub fn parse_response_json(bytes: &[u8]) -> Option<Value> {
    if bytes.is_empty() {
        None
    } else {
        Some(parse_json(bytes))
    }
}

/// Buffer a request body up to `limit` bytes.
///
/// Returns a replacement body carrying the same bytes and the parsed JSON.
pub async fn buffer_request(body: Body, limit: usize) -> Result<(Body, Value), axum::Error> {
    let bytes = axum::body::to_bytes(body, limit).await?;
    let json = parse_json(&bytes);
    Ok((Body::from(bytes), json))
}

/// Whether a buffering error came from the size limit rather than the
/// underlying stream.
pub fn is_over_limit(error: &axum::Error) -> bool {
    let mut source: Option<&(dyn StdError + 'static)> = Some(error);
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return true;
        }
        source = e.source();
    }
    false
}

/// Buffer a response body and reattach it.
///
/// A body that fails mid-stream is replaced by an empty one and recorded as
/// `null`; the status and headers are kept.
pub async fn capture_response(response: Response) -> (Response, Option<Value>) {
    let (parts, body) = response.into_parts();

    match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => {
            let json = parse_response_json(&bytes);
            (Response::from_parts(parts, Body::from(bytes)), json)
        }
        Err(e) => {
            tracing::warn!(error = %e, status = %parts.status, "Failed to read response body");
            (Response::from_parts(parts, Body::from(Bytes::new())), Some(Value::Null))
        }
    }
}
