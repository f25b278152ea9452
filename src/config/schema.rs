//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the Snippit API.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Deployment environment tag ("development", "production", ...).
    pub environment: String,

    /// Externally visible base URL, used for redirect links.
    pub public_url: String,

    /// Listener configuration.
    pub listener: ListenerConfig,

    /// Request limits.
    pub limits: LimitsConfig,

    /// Managed backend (identity, snippets, request log table).
    pub store: StoreConfig,

    /// Outbound mail transport.
    pub smtp: SmtpConfig,

    /// Scheduled job settings.
    pub cron: CronConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Diagnostic endpoints.
    pub debug: DebugConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            public_url: "http://localhost:8080".to_string(),
            listener: ListenerConfig::default(),
            limits: LimitsConfig::default(),
            store: StoreConfig::default(),
            smtp: SmtpConfig::default(),
            cron: CronConfig::default(),
            observability: ObservabilityConfig::default(),
            debug: DebugConfig::default(),
        }
    }
}

impl AppConfig {
    /// Whether the service runs in the production environment.
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_timeout_secs: u64,

    /// Maximum buffered request body size in bytes.
    pub max_body_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            max_body_size: 1024 * 1024, // 1MB
        }
    }
}

/// Managed backend connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Project base URL (e.g., "https://xyz.supabase.co").
    pub url: Option<String>,

    /// Service-role key, preferred for request log inserts.
    pub service_role_key: Option<String>,

    /// Public anon key, used for user-scoped calls.
    pub anon_key: Option<String>,

    /// Table receiving request log records.
    pub log_table: String,

    /// Table holding snippets.
    pub snippets_table: String,

    /// Outbound request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: None,
            service_role_key: None,
            anon_key: None,
            log_table: "request_logs".to_string(),
            snippets_table: "snippets".to_string(),
            timeout_secs: 10,
        }
    }
}

impl StoreConfig {
    /// Key used for request log inserts: service role first, anon as fallback.
    pub fn log_key(&self) -> Option<&str> {
        self.service_role_key
            .as_deref()
            .or(self.anon_key.as_deref())
    }
}

/// SMTP transport configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    /// Implicit TLS (typically port 465). STARTTLS otherwise.
    pub secure: bool,
    pub user: Option<String>,
    pub pass: Option<String>,
    /// Sender address; falls back to `user`.
    pub from: Option<String>,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "smtp.gmail.com".to_string(),
            port: 587,
            secure: false,
            user: None,
            pass: None,
            from: None,
        }
    }
}

impl SmtpConfig {
    /// Sender address, if one can be derived.
    pub fn sender(&self) -> Option<&str> {
        self.from.as_deref().or(self.user.as_deref())
    }
}

/// Scheduled job settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CronConfig {
    /// Recipient of job notifications. Notifications are skipped when unset.
    pub notification_email: Option<String>,

    /// Bearer secret expected on scheduled requests in production.
    pub secret: Option<String>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default filter directive when RUST_LOG is unset.
    pub log_level: String,

    /// Output format: "pretty" or "json".
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "snippit=info,tower_http=info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Diagnostic endpoint settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Expose `/api/debug` and `/api/debug/email-config`.
    pub endpoints_enabled: bool,
}
