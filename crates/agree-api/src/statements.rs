//! Handlers for `/statements` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/statements` | `{top, by_variants, recent}` |
//! | `POST`   | `/statements` | Body: `{"content":"..."}`, principal required |
//! | `GET`    | `/statements/{id}` | Detail with counts; `agreed` when a principal is present |
//! | `PATCH`  | `/statements/{id}` | Body: `{"content":"..."}`, principal required |
//! | `DELETE` | `/statements/{id}` | 409 if the statement has variants |
//! | `POST`   | `/statements/{id}/variants` | Body: `{"content":"..."}`, principal required |
//! | `GET`    | `/statements/{id}/children` | |
//! | `GET`    | `/statements/{id}/ancestors` | Nearest first |
//! | `GET`    | `/statements/{id}/descendants` | Shallowest first |
//! | `GET`    | `/statements/{id}/descendant_count` | `{"count":n}` |

use agree_core::{
  statement::{Content, NewStatement, RankedStatement, Statement},
  store::StatementStore,
};
use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{
  AppState,
  error::ApiError,
  extract::{JsonBody, Path},
  principal::Principal,
};

/// Entries per section of the index view.
pub const INDEX_LIMIT: usize = 10;

#[derive(Debug, Deserialize)]
pub struct ContentBody {
  pub content: String,
}

// ─── Index ───────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct IndexView {
  pub top:         Vec<RankedStatement>,
  pub by_variants: Vec<RankedStatement>,
  pub recent:      Vec<Statement>,
}

/// `GET /statements`
pub async fn index<S: StatementStore>(
  State(state): State<AppState<S>>,
) -> Result<Json<IndexView>, ApiError> {
  let store = &state.store;
  let top = store.top_by_votes(INDEX_LIMIT).await.map_err(ApiError::from_store)?;
  let by_variants = store
    .top_by_descendants(INDEX_LIMIT)
    .await
    .map_err(ApiError::from_store)?;
  let recent = store.most_recent(INDEX_LIMIT).await.map_err(ApiError::from_store)?;
  Ok(Json(IndexView { top, by_variants, recent }))
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// `POST /statements`
pub async fn create<S: StatementStore>(
  State(state): State<AppState<S>>,
  Principal(author_id): Principal,
  JsonBody(body): JsonBody<ContentBody>,
) -> Result<impl IntoResponse, ApiError> {
  let content = Content::parse(&body.content)?;
  insert(&state, NewStatement::root(content, author_id)).await
}

/// `POST /statements/{id}/variants`
pub async fn create_variant<S: StatementStore>(
  State(state): State<AppState<S>>,
  Path(parent_id): Path<Uuid>,
  Principal(author_id): Principal,
  JsonBody(body): JsonBody<ContentBody>,
) -> Result<impl IntoResponse, ApiError> {
  let content = Content::parse(&body.content)?;
  insert(&state, NewStatement::variant(content, author_id, parent_id)).await
}

async fn insert<S: StatementStore>(
  state: &AppState<S>,
  input: NewStatement,
) -> Result<(StatusCode, Json<Statement>), ApiError> {
  let statement = state
    .store
    .create_statement(input)
    .await
    .map_err(ApiError::from_store)?;
  state.renders.enqueue(statement.statement_id);
  Ok((StatusCode::CREATED, Json(statement)))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct StatementDetail {
  #[serde(flatten)]
  pub statement:        Statement,
  pub vote_count:       u64,
  pub descendant_count: u64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub agreed:           Option<bool>,
}

/// `GET /statements/{id}`
pub async fn get_one<S: StatementStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  principal: Option<Principal>,
) -> Result<Json<StatementDetail>, ApiError> {
  let store = &state.store;
  let statement = store
    .get_statement(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("statement {id}")))?;

  let vote_count = store.vote_count(id).await.map_err(ApiError::from_store)?;
  let descendant_count = store.descendant_count(id).await.map_err(ApiError::from_store)?;
  let agreed = match principal {
    Some(Principal(voter)) => Some(store.has_voted(voter, id).await.map_err(ApiError::from_store)?),
    None => None,
  };

  Ok(Json(StatementDetail { statement, vote_count, descendant_count, agreed }))
}

// ─── Update / delete ─────────────────────────────────────────────────────────

/// `PATCH /statements/{id}`
pub async fn update<S: StatementStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Principal(_): Principal,
  JsonBody(body): JsonBody<ContentBody>,
) -> Result<Json<Statement>, ApiError> {
  let content = Content::parse(&body.content)?;
  let statement = state
    .store
    .update_content(id, content)
    .await
    .map_err(ApiError::from_store)?;
  state.renders.enqueue(id);
  Ok(Json(statement))
}

/// `DELETE /statements/{id}`
pub async fn delete_one<S: StatementStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Principal(_): Principal,
) -> Result<StatusCode, ApiError> {
  state
    .store
    .delete_statement(id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Hierarchy ───────────────────────────────────────────────────────────────

/// `GET /statements/{id}/children`
pub async fn children<S: StatementStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Statement>>, ApiError> {
  let children = state.store.children_of(id).await.map_err(ApiError::from_store)?;
  Ok(Json(children))
}

/// `GET /statements/{id}/ancestors`
pub async fn ancestors<S: StatementStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Statement>>, ApiError> {
  let ancestors = state.store.ancestors_of(id).await.map_err(ApiError::from_store)?;
  Ok(Json(ancestors))
}

/// `GET /statements/{id}/descendants`
pub async fn descendants<S: StatementStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Statement>>, ApiError> {
  let descendants = state.store.descendants_of(id).await.map_err(ApiError::from_store)?;
  Ok(Json(descendants))
}

/// `GET /statements/{id}/descendant_count`
pub async fn descendant_count<S: StatementStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
  let count = state.store.descendant_count(id).await.map_err(ApiError::from_store)?;
  Ok(Json(json!({ "count": count })))
}
