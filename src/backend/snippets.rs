//! Snippet persistence over PostgREST.

use async_trait::async_trait;
use reqwest::header::CONTENT_RANGE;
use reqwest::Method;
use uuid::Uuid;

use crate::backend::client::{content_range_total, SupabaseClient};
use crate::backend::types::{
    BackendError, ListQuery, NewSnippet, Snippet, SnippetPage, SnippetPatch,
};
use crate::backend::SnippetStore;

/// `SnippetStore` backed by a PostgREST table.
#[derive(Debug, Clone)]
pub struct PostgrestSnippets {
    client: SupabaseClient,
    table: String,
}

impl PostgrestSnippets {
    pub fn new(client: SupabaseClient, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }
}

/// Filter parameters for a listing, in PostgREST syntax.
pub fn list_params(owner: Uuid, query: &ListQuery) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("select", "*".to_string()),
        ("owner_id", format!("eq.{owner}")),
        ("order", "updated_at.desc".to_string()),
        ("offset", query.offset().to_string()),
        ("limit", query.limit.to_string()),
    ];

    if query.favorites_only {
        params.push(("is_favorite", "eq.true".to_string()));
    }
    if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
        let pattern = ilike_pattern(search);
        params.push(("or", format!("(title.ilike.{pattern},code.ilike.{pattern})")));
    }
    if let Some(language) = query.language.as_deref().filter(|s| !s.is_empty()) {
        params.push(("language", format!("eq.{language}")));
    }

    params
}

/// Quoted `*term*` pattern, so commas and parentheses in the search term
/// can't break out of the `or=(...)` group.
fn ilike_pattern(term: &str) -> String {
    let escaped = term.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"*{escaped}*\"")
}

fn owned_row(owner: Uuid, id: Uuid) -> [(&'static str, String); 2] {
    [("id", format!("eq.{id}")), ("owner_id", format!("eq.{owner}"))]
}

#[async_trait]
impl SnippetStore for PostgrestSnippets {
    async fn list(
        &self,
        access_token: &str,
        owner: Uuid,
        query: &ListQuery,
    ) -> Result<SnippetPage, BackendError> {
        let url = self.client.rest_url(&self.table)?;
        let request = self
            .client
            .request(Method::GET, url, Some(access_token))
            .query(&list_params(owner, query))
            .header("Prefer", "count=exact");

        let response = SupabaseClient::send(request).await?;
        let total = response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(content_range_total);
        let snippets: Vec<Snippet> = response.json().await?;

        let total = total.unwrap_or_else(|| query.offset() + snippets.len() as u64);
        Ok(SnippetPage { snippets, total })
    }

    async fn create(&self, access_token: &str, snippet: &NewSnippet) -> Result<Snippet, BackendError> {
        let url = self.client.rest_url(&self.table)?;
        let request = self
            .client
            .request(Method::POST, url, Some(access_token))
            .header("Prefer", "return=representation")
            .json(&[snippet]);

        let rows: Vec<Snippet> = SupabaseClient::send(request).await?.json().await?;
        rows.into_iter()
            .next()
            .ok_or(BackendError::Unexpected("insert returned no rows"))
    }

    async fn update(
        &self,
        access_token: &str,
        owner: Uuid,
        id: Uuid,
        patch: &SnippetPatch,
    ) -> Result<Option<Snippet>, BackendError> {
        let url = self.client.rest_url(&self.table)?;
        let request = self
            .client
            .request(Method::PATCH, url, Some(access_token))
            .query(&owned_row(owner, id))
            .header("Prefer", "return=representation")
            .json(patch);

        let rows: Vec<Snippet> = SupabaseClient::send(request).await?.json().await?;
        Ok(rows.into_iter().next())
    }

    async fn delete(&self, access_token: &str, owner: Uuid, id: Uuid) -> Result<(), BackendError> {
        let url = self.client.rest_url(&self.table)?;
        let request = self
            .client
            .request(Method::DELETE, url, Some(access_token))
            .query(&owned_row(owner, id));

        SupabaseClient::send(request).await?;
        Ok(())
    }
}
