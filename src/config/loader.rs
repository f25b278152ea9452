//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {var}: {value:?}")]
    Env { var: &'static str, value: String },

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration: optional TOML file, then process environment, then validation.
pub fn load(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut config = match path {
        Some(path) => load_file(path)?,
        None => AppConfig::default(),
    };

    apply_env(&mut config, |name| std::env::var(name).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Parse a TOML file without validating it.
pub fn load_file(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Overlay environment variables on top of file configuration.
///
/// `lookup` abstracts the environment so tests don't touch process state.
/// Empty values are treated as unset.
pub fn apply_env<F>(config: &mut AppConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(v) = get("SNIPPIT_BIND_ADDRESS") {
        config.listener.bind_address = v;
    }
    if let Some(v) = get("SNIPPIT_ENV") {
        config.environment = v;
    }
    if let Some(v) = get("SNIPPIT_PUBLIC_URL") {
        config.public_url = v;
    }
    if let Some(v) = get("SNIPPIT_LOG_LEVEL") {
        config.observability.log_level = v;
    }
    if let Some(v) = get("SNIPPIT_LOG_FORMAT") {
        config.observability.log_format = v;
    }

    if let Some(v) = get("SUPABASE_URL") {
        config.store.url = Some(v);
    }
    if let Some(v) = get("SUPABASE_SERVICE_ROLE_KEY") {
        config.store.service_role_key = Some(v);
    }
    if let Some(v) = get("SUPABASE_ANON_KEY") {
        config.store.anon_key = Some(v);
    }

    if let Some(v) = get("SMTP_HOST") {
        config.smtp.host = v;
    }
    if let Some(v) = get("SMTP_PORT") {
        config.smtp.port = v.trim().parse().map_err(|_| ConfigError::Env {
            var: "SMTP_PORT",
            value: v.clone(),
        })?;
    }
    if let Some(v) = get("SMTP_SECURE") {
        config.smtp.secure = v.trim() == "true";
    }
    if let Some(v) = get("SMTP_USER") {
        config.smtp.user = Some(v);
    }
    if let Some(v) = get("SMTP_PASS") {
        config.smtp.pass = Some(v);
    }
    if let Some(v) = get("SMTP_FROM") {
        config.smtp.from = Some(v);
    }

    if let Some(v) = get("CRON_NOTIFICATION_EMAIL") {
        config.cron.notification_email = Some(v);
    }
    if let Some(v) = get("CRON_SECRET") {
        config.cron.secret = Some(v);
    }

    Ok(())
}
