//! API error type and [`axum::response::IntoResponse`] implementation.

use agree_core::store::StoreError;
use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("missing or malformed principal")]
  Unauthorized,

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("invalid {field}: {message}")]
  Validation {
    field:   &'static str,
    message: String,
  },

  #[error("render error: {0}")]
  Render(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Classify a backend error by the domain error behind it, if any.
  pub fn from_store<E: StoreError>(err: E) -> Self {
    match err.as_core() {
      Some(core) => Self::from_core_ref(core),
      None => ApiError::Store(Box::new(err)),
    }
  }

  fn from_core_ref(err: &agree_core::Error) -> Self {
    use agree_core::Error as E;
    match err {
      E::Validation { field, message } => ApiError::Validation {
        field:   *field,
        message: message.clone(),
      },
      E::StatementNotFound(_) => ApiError::NotFound(err.to_string()),
      E::HasVariants(_) => ApiError::Conflict(err.to_string()),
      E::RenderFailure(m) => ApiError::Render(m.clone()),
    }
  }
}

impl From<agree_core::Error> for ApiError {
  fn from(err: agree_core::Error) -> Self { Self::from_core_ref(&err) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, body) = match &self {
      ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, json!({ "error": self.to_string() })),
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, json!({ "error": m })),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, json!({ "error": m })),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, json!({ "error": m })),
      ApiError::Validation { field, message } => (
        StatusCode::UNPROCESSABLE_ENTITY,
        json!({ "error": message, "field": field }),
      ),
      ApiError::Render(m) => (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": m })),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure");
        (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": e.to_string() }))
      }
    };
    (status, Json(body)).into_response()
  }
}
