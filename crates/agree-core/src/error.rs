//! Error types for `agree-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  /// Submitted input was rejected; `field` names the offending input.
  #[error("invalid {field}: {message}")]
  Validation {
    field:   &'static str,
    message: String,
  },

  #[error("statement not found: {0}")]
  StatementNotFound(Uuid),

  /// Deleting would orphan variants, and statements are never reparented.
  #[error("statement {0} has variants and cannot be deleted")]
  HasVariants(Uuid),

  #[error("card render failed: {0}")]
  RenderFailure(String),
}

impl Error {
  pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
    Self::Validation { field, message: message.into() }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
