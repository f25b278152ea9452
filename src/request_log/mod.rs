//! Per-request observability: one persisted record per handled API request.
//!
//! # Data Flow
//! ```text
//! Request<Body>
//!     → extract.rs (ip, user agent, filtered headers, folded query)
//!     → capture.rs (buffer + parse request body, non-GET/HEAD only)
//!     → handler (wrapped; Err or panic becomes a generic 500)
//!     → capture.rs (buffer + parse response body)
//!     → LogRecord
//!     → sink.rs (spawned insert, never awaited by the request)
//! Response returned to the client
//! ```
//!
//! # Design Decisions
//! - Logging never delays or alters the response
//! - Every lookup falls back to a default; extraction cannot fail
//! - A failed write is logged locally and dropped, never retried

pub mod capture;
pub mod extract;
pub mod logger;
pub mod record;
pub mod sink;

pub use logger::{log_requests, RequestLogger};
pub use record::{LogRecord, QueryValue};
pub use sink::{LogSink, PostgrestLogSink, SinkError};
