//! Card image endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/statements/{id}/cards/{variant}` | Cached SVG; `202` while the first render is pending |
//! | `GET`  | `/statements/{id}/svg` | Renders from current content, bypassing the cache |
//!
//! Both accept `?theme=light|dark`; `og` only exists in the light theme.

use agree_core::{
  card::{CardKind, CardVariant, SVG_CONTENT_TYPE, Theme},
  store::StatementStore,
};
use axum::{
  Json,
  extract::State,
  http::{HeaderMap, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{
  AppState,
  error::ApiError,
  extract::{Path, Query},
};

#[derive(Debug, Default, Deserialize)]
pub struct CardParams {
  #[serde(default)]
  pub theme: Theme,
}

fn kind_for(variant: CardVariant, theme: Theme) -> Result<CardKind, ApiError> {
  CardKind::from_parts(variant, theme)
    .ok_or_else(|| ApiError::BadRequest(format!("{variant} cards have no {theme} theme")))
}

/// `GET /statements/{id}/cards/{variant}[?theme=...]`
pub async fn cached<S: StatementStore>(
  State(state): State<AppState<S>>,
  Path((id, variant)): Path<(Uuid, CardVariant)>,
  Query(params): Query<CardParams>,
  headers: HeaderMap,
) -> Result<Response, ApiError> {
  let kind = kind_for(variant, params.theme)?;

  let Some(card) = state.store.get_card(id, kind).await.map_err(ApiError::from_store)? else {
    state
      .store
      .get_statement(id)
      .await
      .map_err(ApiError::from_store)?
      .ok_or_else(|| ApiError::NotFound(format!("statement {id}")))?;
    return Ok((StatusCode::ACCEPTED, Json(json!({ "status": "pending" }))).into_response());
  };

  let not_modified = headers
    .get(header::IF_NONE_MATCH)
    .and_then(|v| v.to_str().ok())
    .is_some_and(|tag| tag == card.etag);
  if not_modified {
    return Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, card.etag)]).into_response());
  }

  Ok(
    (
      StatusCode::OK,
      [(header::CONTENT_TYPE, card.content_type), (header::ETAG, card.etag)],
      card.body,
    )
      .into_response(),
  )
}

#[derive(Debug, Default, Deserialize)]
pub struct SvgParams {
  pub variant: Option<CardVariant>,
  #[serde(default)]
  pub theme:   Theme,
}

/// `GET /statements/{id}/svg[?variant=...][&theme=...]`
pub async fn live<S: StatementStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Query(params): Query<SvgParams>,
) -> Result<Response, ApiError> {
  let variant = params.variant.unwrap_or(CardVariant::Square);
  kind_for(variant, params.theme)?;

  let statement = state
    .store
    .get_statement(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("statement {id}")))?;

  let body = agree_card::render(&statement.content, variant, params.theme)
    .map_err(agree_core::Error::from)?;
  Ok(([(header::CONTENT_TYPE, SVG_CONTENT_TYPE)], body).into_response())
}
