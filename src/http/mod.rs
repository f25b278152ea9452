//! HTTP surface.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (request id, trace span)
//!     → request_log::log_requests (all /api routes except debug)
//!     → timeout
//!     → handlers/* (auth via identity provider, delegate to backend)
//!     → error.rs (ApiError → { "error": message })
//!     → Send to client
//! ```

pub mod error;
pub mod handlers;
pub mod server;

pub use error::ApiError;
pub use server::{AppState, HttpServer};
