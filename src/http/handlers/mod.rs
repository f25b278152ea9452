//! Route handlers and the helpers they share.

pub mod auth;
pub mod cron;
pub mod debug;
pub mod health;
pub mod snippets;

use axum::body::Bytes;
use axum::http::{header::AUTHORIZATION, HeaderMap};
use serde::de::DeserializeOwned;

use crate::backend::User;
use crate::http::error::ApiError;
use crate::http::server::AppState;

/// Access token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Resolve the caller. Any failure to identify them is a 401, except an
/// unconfigured backend.
pub async fn require_user<'h>(
    state: &AppState,
    headers: &'h HeaderMap,
) -> Result<(User, &'h str), ApiError> {
    let token = bearer_token(headers).ok_or(ApiError::Unauthorized)?;

    match state.identity.get_user(token).await {
        Ok(Some(user)) => Ok((user, token)),
        Ok(None) => Err(ApiError::Unauthorized),
        Err(crate::backend::BackendError::NotConfigured) => Err(ApiError::Unavailable),
        Err(e) => {
            tracing::warn!(error = %e, "Token lookup failed");
            Err(ApiError::Unauthorized)
        }
    }
}

/// Decode a JSON request body.
pub fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!(error = %e, "Rejected request body");
        ApiError::bad_request("Invalid JSON body")
    })
}

/// Treat empty strings like missing values.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
