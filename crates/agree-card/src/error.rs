//! Error types for card rendering and the render worker.

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  #[error("SVG generation failed: {0}")]
  Svg(String),

  #[error("invalid blob key: {0}")]
  InvalidKey(String),

  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),

  #[error("store error: {0}")]
  Store(#[source] BoxError),

  #[error("upload of {key} failed: {source}")]
  Upload {
    key:    String,
    #[source]
    source: BoxError,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<Error> for agree_core::Error {
  fn from(err: Error) -> Self { agree_core::Error::RenderFailure(err.to_string()) }
}
