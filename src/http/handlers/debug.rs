//! Configuration diagnostics. Only routed when `debug.endpoints_enabled`.

use axum::{extract::State, Json};
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};

use crate::http::server::AppState;

fn check(present: bool) -> &'static str {
    if present {
        "✓ Set"
    } else {
        "✗ Missing"
    }
}

fn set(present: bool) -> &'static str {
    if present {
        "SET"
    } else {
        "NOT SET"
    }
}

/// First 30 characters of the store URL.
fn url_preview(url: Option<&str>) -> String {
    match url {
        Some(url) => format!("{}...", url.chars().take(30).collect::<String>()),
        None => "NOT SET".to_string(),
    }
}

pub async fn store_status(State(state): State<AppState>) -> Json<Value> {
    let store = &state.config.store;

    Json(json!({
        "environment": state.config.environment,
        "checks": {
            "SUPABASE_URL": check(store.url.is_some()),
            "SUPABASE_SERVICE_ROLE_KEY": check(store.service_role_key.is_some()),
            "SUPABASE_ANON_KEY": check(store.anon_key.is_some()),
        },
        "supabase_url_preview": url_preview(store.url.as_deref()),
        "note": "Disable debug.endpoints_enabled when not debugging",
    }))
}

pub async fn email_config(State(state): State<AppState>) -> Json<Value> {
    let smtp = &state.config.smtp;
    let cron = &state.config.cron;

    Json(json!({
        "message": "Email configuration status",
        "config": {
            "smtp_host": set(!smtp.host.is_empty()),
            "smtp_port": set(smtp.port != 0),
            "smtp_secure": smtp.secure,
            "smtp_user": set(smtp.user.is_some()),
            "smtp_pass": set(smtp.pass.is_some()),
            "smtp_from": set(smtp.from.is_some()),
            "cron_notification_email": set(cron.notification_email.is_some()),
            "cron_notification_email_value": cron.notification_email.as_deref().unwrap_or("NOT SET"),
        },
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}
