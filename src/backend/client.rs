//! Shared HTTP client for the managed backend.
//!
//! # Responsibilities
//! - Hold one `reqwest::Client` per key, reused for every call
//! - Build `/rest/v1` and `/auth/v1` endpoint URLs
//! - Attach `apikey` and bearer headers
//! - Turn non-success responses into `BackendError::Rejected`

use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::backend::types::BackendError;
use crate::config::StoreConfig;

/// Client bound to one project URL and one API key.
#[derive(Clone)]
pub struct SupabaseClient {
    http: reqwest::Client,
    base: Url,
    api_key: String,
}

impl SupabaseClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, BackendError> {
        let mut base = Url::parse(base_url)?;
        // `Url::join` replaces the last segment unless the path ends with '/'.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base,
            api_key: api_key.to_string(),
        })
    }

    /// Build a client from config with the given key, if both URL and key are set.
    pub fn from_config(config: &StoreConfig, key: Option<&str>) -> Result<Option<Self>, BackendError> {
        match (config.url.as_deref(), key) {
            (Some(url), Some(key)) => {
                Self::new(url, key, Duration::from_secs(config.timeout_secs)).map(Some)
            }
            _ => Ok(None),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub fn rest_url(&self, table: &str) -> Result<Url, BackendError> {
        Ok(self.base.join(&format!("rest/v1/{table}"))?)
    }

    pub fn auth_url(&self, path: &str) -> Result<Url, BackendError> {
        Ok(self.base.join(&format!("auth/v1/{path}"))?)
    }

    /// Start a request. `bearer` is the caller's access token; without one
    /// the API key itself is sent as the bearer.
    pub fn request(&self, method: Method, url: Url, bearer: Option<&str>) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(bearer.unwrap_or(&self.api_key))
    }

    /// Send and map non-success statuses to `BackendError::Rejected`.
    pub async fn send(request: RequestBuilder) -> Result<Response, BackendError> {
        let response = request.send().await?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(rejection(response).await)
        }
    }
}

impl std::fmt::Debug for SupabaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseClient")
            .field("base", &self.base.as_str())
            .finish_non_exhaustive()
    }
}

/// Error body shapes used by PostgREST (`message`, `details`, `hint`, `code`)
/// and GoTrue (`msg`, `error_description`, `error`).
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
    details: Option<String>,
    hint: Option<String>,
    code: Option<Value>,
}

async fn rejection(response: Response) -> BackendError {
    let status = response.status();
    let body: ErrorBody = response.json().await.unwrap_or_default();

    let message = body
        .message
        .or(body.msg)
        .or(body.error_description)
        .or(body.error)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Backend request failed")
                .to_string()
        });

    let code = body.code.map(|code| match code {
        Value::String(s) => s,
        other => other.to_string(),
    });

    BackendError::Rejected {
        status: status.as_u16(),
        message,
        details: body.details,
        hint: body.hint,
        code,
    }
}

/// Total from a PostgREST `Content-Range` header (`0-9/42`, `*/0`).
pub fn content_range_total(value: &str) -> Option<u64> {
    value.split_once('/')?.1.trim().parse().ok()
}
