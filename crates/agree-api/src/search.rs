//! Handler for `GET /search`.

use agree_core::{statement::Statement, store::StatementStore};
use axum::{Json, extract::State};
use serde::Deserialize;

use crate::{AppState, error::ApiError, extract::Query};

pub const DEFAULT_LIMIT: usize = 20;
pub const MAX_LIMIT: usize = 100;

#[derive(Debug, Deserialize, Default)]
pub struct SearchParams {
  /// Case-insensitive substring matched against statement content.
  pub q:     Option<String>,
  pub limit: Option<usize>,
}

/// `GET /search?q=...[&limit=...]`
///
/// A missing or blank query yields an empty list.
pub async fn handler<S: StatementStore>(
  State(state): State<AppState<S>>,
  Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Statement>>, ApiError> {
  let text = params.q.as_deref().map(str::trim).unwrap_or_default();
  if text.is_empty() {
    return Ok(Json(Vec::new()));
  }

  let limit = params.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
  let statements = state
    .store
    .search(text, limit)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(statements))
}
