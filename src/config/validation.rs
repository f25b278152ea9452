//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ports valid)
//! - Check addresses and URLs parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::AppConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a loaded configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.limits.request_timeout_secs == 0 {
        errors.push(ValidationError::new("limits.request_timeout_secs", "must be > 0"));
    }
    if config.limits.max_body_size == 0 {
        errors.push(ValidationError::new("limits.max_body_size", "must be > 0"));
    }

    if let Some(raw) = &config.store.url {
        match Url::parse(raw) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => errors.push(ValidationError::new(
                "store.url",
                format!("unsupported scheme '{}'", url.scheme()),
            )),
            Err(e) => errors.push(ValidationError::new("store.url", e.to_string())),
        }
    }
    if config.store.timeout_secs == 0 {
        errors.push(ValidationError::new("store.timeout_secs", "must be > 0"));
    }
    if config.store.log_table.trim().is_empty() {
        errors.push(ValidationError::new("store.log_table", "must not be empty"));
    }

    if config.smtp.port == 0 {
        errors.push(ValidationError::new("smtp.port", "must be > 0"));
    }

    if Url::parse(&config.public_url).is_err() {
        errors.push(ValidationError::new("public_url", "must be an absolute URL"));
    }

    if !matches!(config.observability.log_format.as_str(), "pretty" | "json") {
        errors.push(ValidationError::new(
            "observability.log_format",
            format!("unknown format '{}'", config.observability.log_format),
        ));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if config.is_production() && config.cron.secret.is_none() {
        errors.push(ValidationError::new("cron.secret", "required in production"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
