//! Request log persistence.

use async_trait::async_trait;
use reqwest::Method;
use thiserror::Error;

use crate::backend::{BackendError, SupabaseClient};
use crate::config::StoreConfig;
use crate::request_log::record::LogRecord;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("log store write failed: {0}")]
    Backend(#[from] BackendError),

    /// In-process sink whose consumer has gone away.
    #[error("log sink closed")]
    Closed,
}

/// Append-only destination for log records. One call per record, no retries.
#[async_trait]
pub trait LogSink: Send + Sync {
    async fn insert(&self, record: &LogRecord) -> Result<(), SinkError>;
}

/// Inserts rows into a PostgREST table.
#[derive(Debug, Clone)]
pub struct PostgrestLogSink {
    client: SupabaseClient,
    table: String,
}

impl PostgrestLogSink {
    pub fn new(client: SupabaseClient, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }

    /// `Ok(None)` when the store URL or both keys are missing.
    pub fn from_config(config: &StoreConfig) -> Result<Option<Self>, BackendError> {
        Ok(SupabaseClient::from_config(config, config.log_key())?
            .map(|client| Self::new(client, config.log_table.clone())))
    }
}

#[async_trait]
impl LogSink for PostgrestLogSink {
    async fn insert(&self, record: &LogRecord) -> Result<(), SinkError> {
        let url = self.client.rest_url(&self.table)?;
        let request = self
            .client
            .request(Method::POST, url, None)
            .header("Prefer", "return=minimal")
            .json(record);

        SupabaseClient::send(request).await?;
        Ok(())
    }
}

/// Settings that must be present for the store-backed sink, as env var names.
pub fn missing_settings(config: &StoreConfig) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if config.url.is_none() {
        missing.push("SUPABASE_URL");
    }
    if config.log_key().is_none() {
        missing.push("SUPABASE_SERVICE_ROLE_KEY or SUPABASE_ANON_KEY");
    }
    missing
}
