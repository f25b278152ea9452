//! The request wrapper: timing, handler isolation, and logging dispatch.
//!
//! ```text
//! RECEIVED → EXTRACTING_METADATA → INVOKING_HANDLER
//!     → SUCCESS | HANDLER_FAILED
//!     → RESPONSE_READY   (returned to the caller)
//!     → LOGGING          (spawned) → LOGGED | LOG_FAILED
//! ```

use std::any::Any;
use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use futures_util::FutureExt;
use serde_json::{json, Value};

use crate::config::AppConfig;
use crate::observability::metrics;
use crate::request_log::capture;
use crate::request_log::extract::RequestMeta;
use crate::request_log::record::LogRecord;
use crate::request_log::sink::{missing_settings, LogSink, PostgrestLogSink};

/// Wraps handlers and ships one `LogRecord` per request to the sink.
///
/// Cheap to clone; the sink and its HTTP client are shared.
#[derive(Clone)]
pub struct RequestLogger {
    sink: Option<Arc<dyn LogSink>>,
    missing: Arc<[&'static str]>,
    max_body_size: usize,
}

impl RequestLogger {
    pub fn new(sink: Arc<dyn LogSink>, max_body_size: usize) -> Self {
        Self {
            sink: Some(sink),
            missing: Arc::from(Vec::new()),
            max_body_size,
        }
    }

    /// A logger with no store: records are dropped with a diagnostic.
    pub fn unconfigured(max_body_size: usize) -> Self {
        Self {
            sink: None,
            missing: Arc::from(Vec::new()),
            max_body_size,
        }
    }

    /// Build the store-backed logger. Missing settings leave it unconfigured.
    pub fn from_config(config: &AppConfig) -> Self {
        let sink = match PostgrestLogSink::from_config(&config.store) {
            Ok(Some(sink)) => Some(Arc::new(sink) as Arc<dyn LogSink>),
            Ok(None) => None,
            Err(e) => {
                tracing::error!(error = %e, "Failed to initialize request log store client");
                None
            }
        };

        Self {
            sink,
            missing: missing_settings(&config.store).into(),
            max_body_size: config.limits.max_body_size,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.sink.is_some()
    }

    /// Run `handler` on `request` and always produce a response.
    ///
    /// The handler receives the request with its body intact. An `Err` or a
    /// panic becomes a 500 with a generic body; the detail only goes to the
    /// local log. A body over the limit is answered with 413 and a body that
    /// fails to read with the same generic 500, both without running the
    /// handler.
    pub async fn wrap<F, Fut, E>(&self, request: Request, handler: F) -> Response
    where
        F: FnOnce(Request) -> Fut,
        Fut: Future<Output = Result<Response, E>>,
        E: fmt::Display,
    {
        let start = Instant::now();
        let (parts, body) = request.into_parts();
        let meta = RequestMeta::from_parts(&parts);

        let (body, captured) = if capture::reads_body(&parts.method) {
            match capture::buffer_request(body, self.max_body_size).await {
                Ok((body, json)) => (body, Some(json)),
                Err(e) if capture::is_over_limit(&e) => {
                    tracing::warn!(
                        method = %meta.method,
                        url = %meta.url,
                        limit = self.max_body_size,
                        "Request body rejected"
                    );
                    let response = error_response(StatusCode::PAYLOAD_TOO_LARGE, "Payload too large");
                    return self.finish(meta, Some(Value::Null), response, start).await;
                }
                Err(e) => {
                    tracing::error!(
                        method = %meta.method,
                        url = %meta.url,
                        error = %e,
                        "Failed to read request body"
                    );
                    return self.finish(meta, Some(Value::Null), internal_error(), start).await;
                }
            }
        } else {
            (body, None)
        };

        let request = Request::from_parts(parts, body);
        let outcome = AssertUnwindSafe(async move { handler(request).await })
            .catch_unwind()
            .await;

        let response = match outcome {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                tracing::error!(method = %meta.method, url = %meta.url, error = %e, "Handler error");
                internal_error()
            }
            Err(panic) => {
                tracing::error!(
                    method = %meta.method,
                    url = %meta.url,
                    panic = panic_message(panic.as_ref()),
                    "Handler panicked"
                );
                internal_error()
            }
        };

        self.finish(meta, captured, response, start).await
    }

    async fn finish(
        &self,
        meta: RequestMeta,
        body: Option<Value>,
        response: Response,
        start: Instant,
    ) -> Response {
        let (response, response_body) = capture::capture_response(response).await;
        let elapsed = start.elapsed();
        let status = response.status().as_u16();

        metrics::record_request(&meta.method, status, elapsed);

        let response_time = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        self.dispatch(LogRecord::new(meta, body, response_body, status, response_time));

        response
    }

    /// Hand a record to the sink on a background task. Never blocks.
    pub fn dispatch(&self, record: LogRecord) {
        let Some(sink) = self.sink.clone() else {
            tracing::error!(
                missing = ?self.missing,
                url = %record.url,
                "Request log store not configured, dropping record"
            );
            metrics::record_log_write("unconfigured");
            return;
        };

        tokio::spawn(async move {
            tracing::debug!(
                method = %record.method,
                url = %record.url,
                ip = %record.ip_address,
                "Logging request"
            );
            match sink.insert(&record).await {
                Ok(()) => {
                    tracing::debug!(url = %record.url, "Request logged");
                    metrics::record_log_write("ok");
                }
                Err(e) => {
                    tracing::error!(url = %record.url, error = %e, detail = ?e, "Failed to log request");
                    metrics::record_log_write("failed");
                }
            }
        });
    }
}

/// Axum middleware running every request through [`RequestLogger::wrap`].
pub async fn log_requests(
    State(logger): State<RequestLogger>,
    request: Request,
    next: Next,
) -> Response {
    logger
        .wrap(request, |request| async move {
            Ok::<_, Infallible>(next.run(request).await)
        })
        .await
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn internal_error() -> Response {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

impl fmt::Debug for RequestLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestLogger")
            .field("configured", &self.sink.is_some())
            .field("max_body_size", &self.max_body_size)
            .finish()
    }
}
