//! agree-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens the
//! SQLite store, starts the card render worker and serves the JSON API over
//! HTTP.
//!
//! # Rebuilding the card cache
//!
//! After a renderer change, queue every statement for re-rendering:
//!
//! ```text
//! cargo run -p agree-server -- --rerender-all
//! ```

mod config;

use std::{path::PathBuf, sync::Arc};

use agree_api::AppState;
use agree_card::{DirectorySink, worker};
use agree_core::store::{RenderQueue as _, StatementStore as _};
use agree_store_sqlite::SqliteStore;
use anyhow::Context as _;
use clap::Parser;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;

#[derive(Parser)]
#[command(author, version, about = "Agree statement server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Queue a card render for every stored statement on startup.
  #[arg(long)]
  rerender_all: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let server_cfg = ServerConfig::load(&cli.config)?;

  // Open SQLite store.
  let store_path = server_cfg.store_path();
  if let Some(parent) = store_path.parent() {
    tokio::fs::create_dir_all(parent)
      .await
      .with_context(|| format!("failed to create {parent:?}"))?;
  }
  let store = Arc::new(
    SqliteStore::open(&store_path)
      .await
      .with_context(|| format!("failed to open store at {store_path:?}"))?,
  );

  // Start the render worker.
  let blob_dir = server_cfg.blob_dir();
  tracing::info!(?blob_dir, "uploading cards");
  let sink = Arc::new(DirectorySink::new(blob_dir));
  let (jobs, render_worker) = worker::spawn(store.clone(), sink, server_cfg.retry_policy());

  if cli.rerender_all {
    let ids = store
      .list_statement_ids()
      .await
      .context("failed to list statements")?;
    for id in &ids {
      jobs.enqueue(*id);
    }
    tracing::info!(count = ids.len(), "queued every statement for re-rendering");
  }

  let state = AppState::new(store, Arc::new(jobs));
  let app = agree_api::api_router(state).layer(TraceLayer::new_for_http());
  let address = server_cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  // The router held the last queue handle; let the worker drain.
  render_worker.await.context("render worker panicked")?;
  tracing::info!("shut down");

  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::warn!(error = %e, "cannot listen for ctrl-c; running until killed");
    std::future::pending::<()>().await;
  }
}
