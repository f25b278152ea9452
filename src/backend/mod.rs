//! Delegation to the managed backend.
//!
//! # Data Flow
//! ```text
//! handlers
//!     → IdentityProvider (GoTrue: signup, token, user, logout, recover)
//!     → SnippetStore (PostgREST: snippets table, owner-scoped)
//!     → client.rs (shared reqwest client, apikey + bearer headers)
//! request_log::sink
//!     → client.rs (service-role key, request_logs table)
//! ```
//!
//! # Design Decisions
//! - Traits at the seam so handlers can run against in-memory fakes
//! - User-scoped calls forward the caller's access token; row-level
//!   security on the backend is the real ownership check, the owner
//!   filters here only narrow the query
//! - No retries: a failed call is reported to the caller once

pub mod auth;
pub mod client;
pub mod snippets;
pub mod types;

use async_trait::async_trait;
use uuid::Uuid;

pub use auth::SupabaseAuth;
pub use client::SupabaseClient;
pub use snippets::PostgrestSnippets;
pub use types::{
    BackendError, ListQuery, NewSnippet, Session, Snippet, SnippetPage, SnippetPatch, User,
};

/// Identity operations delegated to the provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> Result<User, BackendError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, BackendError>;

    /// Resolve an access token. `Ok(None)` means the token was refused.
    async fn get_user(&self, access_token: &str) -> Result<Option<User>, BackendError>;

    async fn sign_out(&self, access_token: &str) -> Result<(), BackendError>;

    async fn reset_password(&self, email: &str, redirect_to: &str) -> Result<(), BackendError>;

    /// Cheap reachability probe.
    async fn ping(&self) -> Result<(), BackendError>;
}

/// Owner-scoped snippet persistence.
#[async_trait]
pub trait SnippetStore: Send + Sync {
    async fn list(
        &self,
        access_token: &str,
        owner: Uuid,
        query: &ListQuery,
    ) -> Result<SnippetPage, BackendError>;

    async fn create(&self, access_token: &str, snippet: &NewSnippet) -> Result<Snippet, BackendError>;

    /// `Ok(None)` when no snippet with `id` belongs to `owner`.
    async fn update(
        &self,
        access_token: &str,
        owner: Uuid,
        id: Uuid,
        patch: &SnippetPatch,
    ) -> Result<Option<Snippet>, BackendError>;

    async fn delete(&self, access_token: &str, owner: Uuid, id: Uuid) -> Result<(), BackendError>;
}

/// Stand-in used when no backend URL is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unconfigured;

#[async_trait]
impl IdentityProvider for Unconfigured {
    async fn sign_up(&self, _: &str, _: &str) -> Result<User, BackendError> {
        Err(BackendError::NotConfigured)
    }

    async fn sign_in(&self, _: &str, _: &str) -> Result<Session, BackendError> {
        Err(BackendError::NotConfigured)
    }

    async fn get_user(&self, _: &str) -> Result<Option<User>, BackendError> {
        Err(BackendError::NotConfigured)
    }

    async fn sign_out(&self, _: &str) -> Result<(), BackendError> {
        Err(BackendError::NotConfigured)
    }

    async fn reset_password(&self, _: &str, _: &str) -> Result<(), BackendError> {
        Err(BackendError::NotConfigured)
    }

    async fn ping(&self) -> Result<(), BackendError> {
        Err(BackendError::NotConfigured)
    }
}

#[async_trait]
impl SnippetStore for Unconfigured {
    async fn list(&self, _: &str, _: Uuid, _: &ListQuery) -> Result<SnippetPage, BackendError> {
        Err(BackendError::NotConfigured)
    }

    async fn create(&self, _: &str, _: &NewSnippet) -> Result<Snippet, BackendError> {
        Err(BackendError::NotConfigured)
    }

    async fn update(
        &self,
        _: &str,
        _: Uuid,
        _: Uuid,
        _: &SnippetPatch,
    ) -> Result<Option<Snippet>, BackendError> {
        Err(BackendError::NotConfigured)
    }

    async fn delete(&self, _: &str, _: Uuid, _: Uuid) -> Result<(), BackendError> {
        Err(BackendError::NotConfigured)
    }
}
