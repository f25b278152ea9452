//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON lines)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! Persisted per-request records live in `request_log`, not here: this
//! module only covers the process-local diagnostic stream.
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID set by tower-http and visible in every request span
//! - Metrics are cheap (atomic increments) and optional

pub mod logging;
pub mod metrics;
