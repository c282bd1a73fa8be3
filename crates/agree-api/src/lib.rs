//! JSON REST API for Agree.
//!
//! Exposes an axum [`Router`] backed by any [`StatementStore`]. Authentication
//! and TLS are the caller's responsibility; the acting user arrives in the
//! `X-Principal-Id` header (see [`principal`]).
//!
//! # Mounting
//!
//! ```rust,ignore
//! let state = AppState::new(store.clone(), Arc::new(render_jobs));
//! axum::Router::new().merge(agree_api::api_router(state))
//! ```

pub mod cards;
pub mod error;
pub mod extract;
pub mod principal;
pub mod search;
pub mod statements;
pub mod votes;

use std::sync::Arc;

use agree_core::store::{RenderQueue, StatementStore};
use axum::{
  Router,
  routing::{get, post},
};

pub use error::ApiError;
pub use principal::Principal;

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct AppState<S> {
  pub store:   Arc<S>,
  /// Receives the id of every statement whose content changed.
  pub renders: Arc<dyn RenderQueue>,
}

impl<S> AppState<S> {
  pub fn new(store: Arc<S>, renders: Arc<dyn RenderQueue>) -> Self { Self { store, renders } }
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:   Arc::clone(&self.store),
      renders: Arc::clone(&self.renders),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router.
///
/// The returned `Router<()>` can be merged into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: StatementStore + 'static,
{
  Router::new()
    // Statements
    .route("/statements", get(statements::index::<S>).post(statements::create::<S>))
    .route(
      "/statements/{id}",
      get(statements::get_one::<S>)
        .patch(statements::update::<S>)
        .delete(statements::delete_one::<S>),
    )
    .route("/statements/{id}/variants", post(statements::create_variant::<S>))
    .route("/statements/{id}/children", get(statements::children::<S>))
    .route("/statements/{id}/ancestors", get(statements::ancestors::<S>))
    .route("/statements/{id}/descendants", get(statements::descendants::<S>))
    .route("/statements/{id}/descendant_count", get(statements::descendant_count::<S>))
    // Votes
    .route("/statements/{id}/agree", post(votes::agree::<S>))
    .route("/statements/sync_agreements", post(votes::sync_agreements::<S>))
    // Cards
    .route("/statements/{id}/cards/{variant}", get(cards::cached::<S>))
    .route("/statements/{id}/svg", get(cards::live::<S>))
    // Search
    .route("/search", get(search::handler::<S>))
    .with_state(state)
}
