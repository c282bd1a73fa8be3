//! Background render worker.
//!
//! Statements are queued by id through [`RenderJobs`]. The worker reads the
//! statement's current content, renders every [`CardKind`], uploads each body
//! to the [`BlobSink`] and only then swaps the cached set in the store. Any
//! failure leaves the previous cache in place and is retried per
//! [`RetryPolicy`].
//!
//! Blobs are uploaded under digest-bearing keys, so a failed pass can leave
//! orphaned new blobs behind but never replaces one the cache refers to.
//!
//! A statement already waiting in the queue is not queued twice. Once its
//! job starts, a further enqueue schedules a fresh pass.

use std::{
  collections::HashSet,
  sync::{Arc, Mutex, PoisonError},
  time::Duration,
};

use agree_core::{
  card::{CardKind, CardRender, SVG_CONTENT_TYPE},
  store::{BlobSink, RenderQueue, StatementStore, StoreError},
};
use bytes::Bytes;
use chrono::Utc;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
  error::{Error, Result},
  render::{etag, render},
};

// ─── Queue ───────────────────────────────────────────────────────────────────

/// Ids queued but not yet picked up by the worker.
type Pending = Arc<Mutex<HashSet<Uuid>>>;

fn lock(pending: &Pending) -> std::sync::MutexGuard<'_, HashSet<Uuid>> {
  pending.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Sending half of the render queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct RenderJobs {
  tx:      mpsc::UnboundedSender<Uuid>,
  pending: Pending,
}

impl RenderQueue for RenderJobs {
  fn enqueue(&self, statement_id: Uuid) {
    if !lock(&self.pending).insert(statement_id) {
      debug!(%statement_id, "render already queued");
      return;
    }
    if self.tx.send(statement_id).is_err() {
      lock(&self.pending).remove(&statement_id);
      warn!(%statement_id, "render worker stopped; job dropped");
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
  /// Attempts per job, including the first. Zero is treated as one.
  pub max_attempts: u32,
  pub delay:        Duration,
}

impl Default for RetryPolicy {
  fn default() -> Self { Self { max_attempts: 3, delay: Duration::from_millis(500) } }
}

/// What a single render pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
  Rendered { cards: usize },
  /// The statement no longer exists; nothing to render.
  Missing,
}

// ─── Worker ──────────────────────────────────────────────────────────────────

/// Start the worker on the current tokio runtime.
///
/// The worker exits once every [`RenderJobs`] handle has been dropped and
/// the queue is drained.
pub fn spawn<S, B>(store: Arc<S>, sink: Arc<B>, policy: RetryPolicy) -> (RenderJobs, JoinHandle<()>)
where
  S: StatementStore + 'static,
  B: BlobSink + 'static,
{
  let (tx, mut rx) = mpsc::unbounded_channel::<Uuid>();
  let pending = Pending::default();
  let queued = Arc::clone(&pending);
  let handle = tokio::spawn(async move {
    while let Some(statement_id) = rx.recv().await {
      lock(&queued).remove(&statement_id);
      run_job(store.as_ref(), sink.as_ref(), policy, statement_id).await;
    }
    debug!("render queue closed");
  });
  (RenderJobs { tx, pending }, handle)
}

async fn run_job<S, B>(store: &S, sink: &B, policy: RetryPolicy, statement_id: Uuid)
where
  S: StatementStore,
  B: BlobSink,
{
  let attempts = policy.max_attempts.max(1);
  for attempt in 1..=attempts {
    match render_statement(store, sink, statement_id).await {
      Ok(JobOutcome::Rendered { cards }) => {
        info!(%statement_id, cards, "cards rendered");
        return;
      }
      Ok(JobOutcome::Missing) => {
        debug!(%statement_id, "statement gone; render skipped");
        return;
      }
      Err(e) if attempt < attempts => {
        warn!(%statement_id, attempt, error = %e, "render attempt failed");
        tokio::time::sleep(policy.delay).await;
      }
      Err(e) => {
        error!(%statement_id, attempts, error = %e, "render failed");
      }
    }
  }
}

/// Render, upload and cache every card kind for one statement.
pub async fn render_statement<S, B>(store: &S, sink: &B, statement_id: Uuid) -> Result<JobOutcome>
where
  S: StatementStore,
  B: BlobSink,
{
  let Some(statement) = store
    .get_statement(statement_id)
    .await
    .map_err(|e| Error::Store(Box::new(e)))?
  else {
    return Ok(JobOutcome::Missing);
  };

  let mut renders = Vec::new();
  for kind in CardKind::all() {
    let body = render(&statement.content, kind.variant(), kind.theme())?;
    let etag = etag(&body);
    let key = kind.blob_key(statement_id, &etag);
    sink
      .put(key.clone(), SVG_CONTENT_TYPE, Bytes::from(body.clone()))
      .await
      .map_err(|e| Error::Upload { key, source: Box::new(e) })?;

    renders.push(CardRender {
      statement_id,
      kind,
      content_type: SVG_CONTENT_TYPE.to_owned(),
      etag,
      body,
      rendered_at: Utc::now(),
    });
  }

  let cards = renders.len();
  match store.put_cards(statement_id, renders).await {
    Ok(()) => Ok(JobOutcome::Rendered { cards }),
    Err(e) if matches!(e.as_core(), Some(agree_core::Error::StatementNotFound(_))) => {
      Ok(JobOutcome::Missing)
    }
    Err(e) => Err(Error::Store(Box::new(e))),
  }
}
