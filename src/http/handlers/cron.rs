//! Scheduled health check.
//!
//! Triggered by an external scheduler. In production the caller must
//! present the cron secret as a bearer token. An unconfigured backend is
//! reported in the payload rather than failing the job.

use std::time::Instant;

use axum::{extract::State, http::HeaderMap, Json};
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};

use crate::backend::BackendError;
use crate::http::error::ApiError;
use crate::http::handlers::bearer_token;
use crate::http::server::AppState;

pub const HEALTH_CHECK_JOB: &str = "health-check";

fn authorized(state: &AppState, headers: &HeaderMap) -> bool {
    if !state.config.is_production() {
        return true;
    }
    match (state.config.cron.secret.as_deref(), bearer_token(headers)) {
        (Some(secret), Some(token)) => secret == token,
        _ => false,
    }
}

pub async fn health_check(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    if !authorized(&state, &headers) {
        return Err(ApiError::Unauthorized);
    }

    let now = Utc::now();
    let day = now.format("%A").to_string();
    let uptime_secs = state.started_at.elapsed().as_secs();

    state.notifier.notify_start(
        HEALTH_CHECK_JOB,
        &[("day", day.clone()), ("environment", state.config.environment.clone())],
    );

    let probe_start = Instant::now();
    let backend = match state.identity.ping().await {
        Ok(()) => "healthy",
        Err(BackendError::NotConfigured) => {
            tracing::warn!("Cron health check ran without a configured backend");
            "not_configured"
        }
        Err(e) => {
            tracing::error!(error = %e, "Cron health check failed");
            state
                .notifier
                .notify_error(HEALTH_CHECK_JOB, &e, &[("uptime_secs", uptime_secs.to_string())]);
            return Err(ApiError::internal("Health check failed", e));
        }
    };
    let backend_latency_ms = u64::try_from(probe_start.elapsed().as_millis()).unwrap_or(u64::MAX);

    state.notifier.notify_end(
        HEALTH_CHECK_JOB,
        &[
            ("backend", backend.to_string()),
            ("backend_latency_ms", backend_latency_ms.to_string()),
            ("uptime_secs", uptime_secs.to_string()),
        ],
    );

    Ok(Json(json!({
        "success": true,
        "message": "Health check completed successfully",
        "type": "scheduled_health_check",
        "timestamp": now.to_rfc3339_opts(SecondsFormat::Millis, true),
        "day": day,
        "scheduled_message": "Automated bi-weekly health check",
        "backend": backend,
        "server_info": {
            "version": env!("CARGO_PKG_VERSION"),
            "platform": std::env::consts::OS,
            "arch": std::env::consts::ARCH,
            "uptime_secs": uptime_secs,
            "backend_latency_ms": backend_latency_ms,
        },
    })))
}
