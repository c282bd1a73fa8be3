//! A [`BlobSink`] that writes blobs under a local directory.

use std::path::{Component, Path, PathBuf};

use agree_core::store::BlobSink;
use bytes::Bytes;

use crate::error::{Error, Result};

/// Stores each blob at `root/<key>`. Writes go through a temporary file and
/// a rename, so readers never see a partial blob.
#[derive(Debug, Clone)]
pub struct DirectorySink {
  root: PathBuf,
}

impl DirectorySink {
  pub fn new(root: impl Into<PathBuf>) -> Self { Self { root: root.into() } }

  pub fn root(&self) -> &Path { &self.root }

  /// Resolve `key` below the root, refusing anything that could escape it.
  pub fn path_for(&self, key: &str) -> Result<PathBuf> {
    let relative = Path::new(key);
    let safe = !key.is_empty()
      && relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)));
    if !safe {
      return Err(Error::InvalidKey(key.to_owned()));
    }
    Ok(self.root.join(relative))
  }
}

impl BlobSink for DirectorySink {
  type Error = Error;

  async fn put(&self, key: String, content_type: &'static str, body: Bytes) -> Result<()> {
    let path = self.path_for(&key)?;
    if let Some(parent) = path.parent() {
      tokio::fs::create_dir_all(parent).await?;
    }

    let mut tmp = path.clone().into_os_string();
    tmp.push(".tmp");
    tokio::fs::write(&tmp, &body).await?;
    tokio::fs::rename(&tmp, &path).await?;

    tracing::debug!(%key, content_type, bytes = body.len(), "blob stored");
    Ok(())
  }
}
