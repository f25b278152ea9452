//! Snippet CRUD for the authenticated user.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::backend::{ListQuery, NewSnippet, SnippetPatch};
use crate::http::error::ApiError;
use crate::http::handlers::{non_empty, parse_body, require_user};
use crate::http::server::AppState;

pub const DEFAULT_LANGUAGE: &str = "plaintext";

/// Raw listing parameters; unparsable numbers fall back to defaults.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    page: Option<String>,
    limit: Option<String>,
    search: Option<String>,
    language: Option<String>,
    favorites: Option<String>,
}

fn positive(raw: Option<&str>, default: u32) -> u32 {
    raw.and_then(|v| v.trim().parse().ok())
        .filter(|v: &u32| *v >= 1)
        .unwrap_or(default)
}

impl From<ListParams> for ListQuery {
    fn from(params: ListParams) -> Self {
        let defaults = ListQuery::default();
        ListQuery {
            page: positive(params.page.as_deref(), defaults.page),
            limit: positive(params.limit.as_deref(), defaults.limit),
            search: non_empty(params.search),
            language: non_empty(params.language),
            favorites_only: params.favorites.as_deref() == Some("true"),
        }
    }
}

pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Result<Json<Value>, ApiError> {
    let (user, token) = require_user(&state, &headers).await?;
    let query = ListQuery::from(params);

    let page = state.snippets.list(token, user.id, &query).await?;

    Ok(Json(json!({
        "snippets": page.snippets,
        "total": page.total,
        "page": query.page,
        "limit": query.limit,
        "hasMore": query.has_more(page.total),
    })))
}

#[derive(Debug, Deserialize)]
struct CreateSnippet {
    title: Option<String>,
    language: Option<String>,
    code: Option<String>,
    is_favorite: Option<bool>,
}

pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let (user, token) = require_user(&state, &headers).await?;
    let input: CreateSnippet = parse_body(&body)?;

    let (Some(title), Some(code)) = (non_empty(input.title), non_empty(input.code)) else {
        return Err(ApiError::bad_request("Title and code are required"));
    };

    let snippet = NewSnippet {
        title,
        language: non_empty(input.language).unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
        code,
        is_favorite: input.is_favorite.unwrap_or(false),
        owner_id: user.id,
    };

    let created = state.snippets.create(token, &snippet).await?;
    tracing::info!(snippet_id = %created.id, owner = %user.id, "Snippet created");

    Ok((StatusCode::CREATED, Json(json!({ "snippet": created }))))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let (user, token) = require_user(&state, &headers).await?;
    let patch: SnippetPatch = parse_body(&body)?;

    if patch.is_empty() {
        return Err(ApiError::bad_request("No fields to update"));
    }

    let updated = state
        .snippets
        .update(token, user.id, id, &patch)
        .await?
        .ok_or(ApiError::NotFound("Snippet not found"))?;

    Ok(Json(json!({ "snippet": updated })))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let (user, token) = require_user(&state, &headers).await?;

    state.snippets.delete(token, user.id, id).await?;
    tracing::info!(snippet_id = %id, owner = %user.id, "Snippet deleted");

    Ok(Json(json!({ "success": true })))
}
