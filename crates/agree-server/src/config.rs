//! Server configuration: a TOML file layered with `AGREE_*` environment
//! variables.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use agree_card::RetryPolicy;
use anyhow::Context as _;
use serde::Deserialize;

pub const ENV_PREFIX: &str = "AGREE";

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                  String,
  #[serde(default = "default_port")]
  pub port:                  u16,
  /// SQLite database file. A leading `~/` is expanded.
  #[serde(default = "default_store_path")]
  pub store_path:            PathBuf,
  /// Directory rendered cards are uploaded to. A leading `~/` is expanded.
  #[serde(default = "default_blob_dir")]
  pub blob_dir:              PathBuf,
  #[serde(default = "default_render_max_attempts")]
  pub render_max_attempts:   u32,
  #[serde(default = "default_render_retry_delay_ms")]
  pub render_retry_delay_ms: u64,
}

fn default_host() -> String { "127.0.0.1".to_owned() }
fn default_port() -> u16 { 3000 }
fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/agree/agree.db") }
fn default_blob_dir() -> PathBuf { PathBuf::from("~/.local/share/agree/cards") }
fn default_render_max_attempts() -> u32 { 3 }
fn default_render_retry_delay_ms() -> u64 { 500 }

impl ServerConfig {
  /// Read `path` (if it exists) and overlay `AGREE_*` environment variables.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = ::config::Config::builder()
      .add_source(::config::File::from(path).required(false))
      .add_source(::config::Environment::with_prefix(ENV_PREFIX))
      .build()
      .context("failed to read config file")?;

    settings
      .try_deserialize()
      .context("failed to deserialise ServerConfig")
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }

  pub fn blob_dir(&self) -> PathBuf { expand_tilde(&self.blob_dir) }

  pub fn retry_policy(&self) -> RetryPolicy {
    RetryPolicy {
      max_attempts: self.render_max_attempts,
      delay:        Duration::from_millis(self.render_retry_delay_ms),
    }
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
