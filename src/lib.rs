//! Snippit API library: snippet storage over a managed backend, with every
//! API request recorded to a request log table.

pub mod backend;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod notify;
pub mod observability;
pub mod request_log;

pub use config::AppConfig;
pub use http::{AppState, HttpServer};
pub use lifecycle::Shutdown;
pub use request_log::RequestLogger;
