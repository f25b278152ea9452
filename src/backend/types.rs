//! Backend types and error definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Errors from calls to the managed backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// No backend URL/key configured.
    #[error("backend not configured")]
    NotConfigured,

    #[error("invalid backend URL: {0}")]
    Url(#[from] url::ParseError),

    /// Connection, timeout or body read failure.
    #[error("backend request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected backend response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("unexpected backend response: {0}")]
    Unexpected(&'static str),

    /// The backend answered with a non-success status.
    #[error("{message}")]
    Rejected {
        status: u16,
        message: String,
        details: Option<String>,
        hint: Option<String>,
        code: Option<String>,
    },
}

impl BackendError {
    pub fn status(&self) -> Option<u16> {
        match self {
            BackendError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// An authenticated identity, as reported by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Tokens returned by a password sign-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub user: User,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// A stored code snippet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snippet {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub language: String,
    pub code: String,
    pub is_favorite: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload; id and timestamps are assigned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewSnippet {
    pub title: String,
    pub language: String,
    pub code: String,
    pub is_favorite: bool,
    pub owner_id: Uuid,
}

/// Partial update; only `Some` fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnippetPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_favorite: Option<bool>,
}

impl SnippetPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.language.is_none()
            && self.code.is_none()
            && self.is_favorite.is_none()
    }
}

/// Listing filters and paging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// 1-based page number.
    pub page: u32,
    pub limit: u32,
    /// Case-insensitive substring over title and code.
    pub search: Option<String>,
    pub language: Option<String>,
    pub favorites_only: bool,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            search: None,
            language: None,
            favorites_only: false,
        }
    }
}

impl ListQuery {
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }

    pub fn has_more(&self, total: u64) -> bool {
        self.offset() + u64::from(self.limit) < total
    }
}

/// One page of snippets plus the unpaged match count.
#[derive(Debug, Clone, PartialEq)]
pub struct SnippetPage {
    pub snippets: Vec<Snippet>,
    pub total: u64,
}
