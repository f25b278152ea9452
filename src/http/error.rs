//! Handler error type and its HTTP rendering.

use std::fmt::Display;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::backend::BackendError;

pub const UNEXPECTED: &str = "An unexpected error occurred";

/// Errors a handler reports to its caller. The `Display` text is what the
/// client sees; `Internal` keeps its detail server-side.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("Service unavailable")]
    Unavailable,

    #[error("{message}")]
    Internal { message: &'static str, detail: String },
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn internal(message: &'static str, detail: impl Display) -> Self {
        ApiError::Internal {
            message,
            detail: detail.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Provider rejections are shown to the user; everything else is generic.
impl From<BackendError> for ApiError {
    fn from(e: BackendError) -> Self {
        match e {
            BackendError::NotConfigured => ApiError::Unavailable,
            BackendError::Rejected { message, .. } => ApiError::BadRequest(message),
            other => ApiError::internal(UNEXPECTED, other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Internal { message, detail } => {
                tracing::error!(error = %detail, "{message}");
            }
            ApiError::Unavailable => {
                tracing::warn!("Backend not configured");
            }
            _ => {}
        }

        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
