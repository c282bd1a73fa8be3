//! Handlers for agreement (vote) endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/statements/{id}/agree` | Optional body: `{"confirmed":false}`; returns a [`ToggleOutcome`] |
//! | `POST` | `/statements/sync_agreements` | Body: `{"statement_ids":[...]}`; returns `{"added":n}` |
//!
//! A `conflict_pending` outcome is a normal 200 response: the client is
//! expected to show the listed ancestors and retry with `confirmed: true`.
//!
//! Sync skips ids that are malformed or unknown rather than failing the batch.

use agree_core::{store::StatementStore, vote::ToggleOutcome};
use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{
  AppState,
  error::ApiError,
  extract::{JsonBody, Path},
  principal::Principal,
};

#[derive(Debug, Default, Deserialize)]
pub struct AgreeBody {
  #[serde(default)]
  pub confirmed: bool,
}

/// `POST /statements/{id}/agree`
pub async fn agree<S: StatementStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Principal(voter): Principal,
  body: Option<JsonBody<AgreeBody>>,
) -> Result<Json<ToggleOutcome>, ApiError> {
  let body = body.map(|JsonBody(b)| b).unwrap_or_default();
  let outcome = state
    .store
    .toggle_vote(voter, id, body.confirmed)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(outcome))
}

#[derive(Debug, Deserialize)]
pub struct SyncBody {
  /// Kept as strings so one malformed entry does not reject the rest.
  pub statement_ids: Vec<String>,
}

/// `POST /statements/sync_agreements`
pub async fn sync_agreements<S: StatementStore>(
  State(state): State<AppState<S>>,
  Principal(voter): Principal,
  JsonBody(body): JsonBody<SyncBody>,
) -> Result<Json<Value>, ApiError> {
  let ids: Vec<Uuid> = body
    .statement_ids
    .iter()
    .filter_map(|raw| match Uuid::parse_str(raw.trim()) {
      Ok(id) => Some(id),
      Err(e) => {
        tracing::debug!(%voter, id = %raw, error = %e, "skipping malformed statement id");
        None
      }
    })
    .collect();
  let added = state
    .store
    .reconcile_votes(voter, &ids)
    .await
    .map_err(ApiError::from_store)?;
  tracing::debug!(%voter, requested = body.statement_ids.len(), added, "agreements synced");
  Ok(Json(json!({ "added": added })))
}
