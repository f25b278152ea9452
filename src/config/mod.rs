//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (environment overrides)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → shared via Arc to handlers, logger, notifier
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow an empty or missing file
//! - Secrets come from the environment and are optional; missing
//!   store or mail settings degrade features instead of failing startup

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load, ConfigError};
pub use schema::{
    AppConfig, CronConfig, DebugConfig, LimitsConfig, ListenerConfig, ObservabilityConfig,
    SmtpConfig, StoreConfig,
};
