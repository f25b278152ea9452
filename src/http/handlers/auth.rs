//! Account endpoints. Credentials and sessions are handled by the identity
//! provider; these handlers validate input and relay results.

use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::http::error::ApiError;
use crate::http::handlers::{bearer_token, non_empty, parse_body};
use crate::http::server::AppState;

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Deserialize)]
struct Credentials {
    email: Option<String>,
    password: Option<String>,
}

impl Credentials {
    fn require(self) -> Result<(String, String), ApiError> {
        match (non_empty(self.email), self.password.filter(|p| !p.is_empty())) {
            (Some(email), Some(password)) => Ok((email, password)),
            _ => Err(ApiError::bad_request("Email and password are required")),
        }
    }
}

pub async fn register(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let (email, password) = parse_body::<Credentials>(&body)?.require()?;

    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let user = state.identity.sign_up(&email, &password).await?;
    tracing::info!(user_id = %user.id, "User registered");

    Ok(Json(json!({
        "success": true,
        "user": user,
        "message": "Registration successful",
    })))
}

pub async fn login(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let (email, password) = parse_body::<Credentials>(&body)?.require()?;

    let session = state.identity.sign_in(&email, &password).await?;

    Ok(Json(json!({ "success": true, "session": session })))
}

/// Signing out an already-invalid session counts as success.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    if let Some(token) = bearer_token(&headers) {
        match state.identity.sign_out(token).await {
            Ok(()) => {}
            Err(e) if matches!(e.status(), Some(401 | 403)) => {
                tracing::debug!(error = %e, "Session already invalid");
            }
            Err(e) => return Err(ApiError::internal("Logout failed", e)),
        }
    }

    Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Deserialize)]
struct ResetRequest {
    email: Option<String>,
}

pub async fn reset_password(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let request: ResetRequest = parse_body(&body)?;
    let email = non_empty(request.email).ok_or_else(|| ApiError::bad_request("Email is required"))?;

    let redirect_to = format!("{}/reset-password", state.config.public_url.trim_end_matches('/'));
    if let Err(e) = state.identity.reset_password(&email, &redirect_to).await {
        tracing::error!(error = %e, "Password reset error");
        return Err(e.into());
    }

    Ok(Json(json!({ "message": "Password reset email sent successfully" })))
}
