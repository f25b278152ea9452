//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGINT/SIGTERM → shutdown_signal() resolves
//!
//! Shutdown (shutdown.rs):
//!     trigger() → every subscriber wakes → server stops accepting,
//!     drains in-flight requests, exits
//! ```
//!
//! # Design Decisions
//! - One broadcast channel; the server and any background task subscribe
//! - Request log writes already spawned are not awaited on exit

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::shutdown_signal;
