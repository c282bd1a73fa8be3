//! The acting principal, as asserted by the fronting auth layer.
//!
//! Authentication happens upstream; by the time a request reaches the API
//! the principal's id travels in the [`PRINCIPAL_HEADER`] header. Handlers
//! that mutate state take [`Principal`]; read handlers that only personalise
//! their output take `Option<Principal>`.

use axum::{
  extract::{FromRequestParts, OptionalFromRequestParts},
  http::{HeaderMap, request::Parts},
};
use uuid::Uuid;

use crate::error::ApiError;

pub const PRINCIPAL_HEADER: &str = "x-principal-id";

/// Id of the user on whose behalf the request is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal(pub Uuid);

/// Read the principal from headers. `Ok(None)` when the header is absent.
pub fn principal_from_headers(headers: &HeaderMap) -> Result<Option<Principal>, ApiError> {
  let Some(value) = headers.get(PRINCIPAL_HEADER) else {
    return Ok(None);
  };
  let id = value
    .to_str()
    .ok()
    .and_then(|s| Uuid::parse_str(s.trim()).ok())
    .ok_or(ApiError::Unauthorized)?;
  Ok(Some(Principal(id)))
}

impl<S: Send + Sync> FromRequestParts<S> for Principal {
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    principal_from_headers(&parts.headers)?.ok_or(ApiError::Unauthorized)
  }
}

impl<S: Send + Sync> OptionalFromRequestParts<S> for Principal {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &S,
  ) -> Result<Option<Self>, Self::Rejection> {
    principal_from_headers(&parts.headers)
  }
}
