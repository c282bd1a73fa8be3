//! The `StatementStore` trait and the collaborator seams used by the card
//! pipeline.
//!
//! The store trait is implemented by storage backends (e.g.
//! `agree-store-sqlite`). Higher layers (`agree-api`, `agree-card`) depend on
//! these abstractions, not on any concrete backend.

use std::future::Future;

use bytes::Bytes;
use uuid::Uuid;

use crate::{
  card::{CardKind, CardRender},
  statement::{Content, NewStatement, RankedStatement, Statement},
  vote::ToggleOutcome,
};

// ─── Error classification ────────────────────────────────────────────────────

/// Backend errors that can be traced back to a domain [`crate::Error`].
///
/// Lets callers tell "unknown statement" or "blank content" apart from an
/// I/O failure without knowing the backend's concrete error type.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn as_core(&self) -> Option<&crate::Error>;
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// Abstraction over an Agree store backend.
///
/// The store owns the vote invariant: for a fixed voter, no two voted
/// statements may be in an ancestor/descendant relationship. Every vote
/// mutation below is a single atomic unit against the backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait StatementStore: Send + Sync {
  type Error: StoreError;

  // ── Statements ──────────────────────────────────────────────────────────

  /// Persist a new statement, attaching it under `parent_id` if given.
  ///
  /// Fails with [`crate::Error::StatementNotFound`] if the parent does not
  /// exist. The closure index is updated in the same transaction.
  fn create_statement(
    &self,
    input: NewStatement,
  ) -> impl Future<Output = Result<Statement, Self::Error>> + Send + '_;

  /// Retrieve a statement by id. Returns `None` if not found.
  fn get_statement(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Statement>, Self::Error>> + Send + '_;

  /// Replace a statement's content. Author and parent are untouched.
  fn update_content(
    &self,
    id: Uuid,
    content: Content,
  ) -> impl Future<Output = Result<Statement, Self::Error>> + Send + '_;

  /// Delete a leaf statement with its votes and cached cards.
  ///
  /// Fails with [`crate::Error::HasVariants`] if the statement has children.
  fn delete_statement(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Every statement id, oldest first.
  fn list_statement_ids(
    &self,
  ) -> impl Future<Output = Result<Vec<Uuid>, Self::Error>> + Send + '_;

  // ── Hierarchy ───────────────────────────────────────────────────────────

  /// Direct variants of `id`, oldest first.
  fn children_of(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Vec<Statement>, Self::Error>> + Send + '_;

  /// Ancestors of `id` from the immediate parent up to the root. Empty for
  /// roots.
  fn ancestors_of(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Vec<Statement>, Self::Error>> + Send + '_;

  /// Every statement reachable from `id` through children, at any depth,
  /// shallowest first.
  fn descendants_of(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Vec<Statement>, Self::Error>> + Send + '_;

  /// `descendants_of(id).len()`, answered from the closure index.
  fn descendant_count(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  // ── Rankings ────────────────────────────────────────────────────────────

  /// Statements ordered by vote count, highest first.
  fn top_by_votes(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<RankedStatement>, Self::Error>> + Send + '_;

  /// Statements with at least one variant, ordered by descendant count.
  fn top_by_descendants(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<RankedStatement>, Self::Error>> + Send + '_;

  /// Newest statements first.
  fn most_recent(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<Statement>, Self::Error>> + Send + '_;

  /// Case-insensitive substring search over content, newest first.
  fn search<'a>(
    &'a self,
    text: &'a str,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<Statement>, Self::Error>> + Send + 'a;

  // ── Votes ───────────────────────────────────────────────────────────────

  /// Toggle `voter`'s endorsement of `statement_id`.
  ///
  /// - Already voted: the vote is removed.
  /// - Not voted, no voted ancestors: a vote is added.
  /// - Not voted, voted ancestors, `confirmed == false`: nothing changes and
  ///   [`ToggleOutcome::ConflictPending`] is returned.
  /// - Not voted, voted ancestors, `confirmed == true`: the ancestor votes
  ///   are removed and the target vote added in one transaction.
  ///
  /// Descendant votes are never examined or altered.
  fn toggle_vote(
    &self,
    voter_id: Uuid,
    statement_id: Uuid,
    confirmed: bool,
  ) -> impl Future<Output = Result<ToggleOutcome, Self::Error>> + Send + '_;

  /// Add a vote for every listed statement the voter has not yet voted for.
  ///
  /// Unknown ids are skipped and conflict detection is bypassed. Returns the
  /// number of votes actually added.
  fn reconcile_votes<'a>(
    &'a self,
    voter_id: Uuid,
    statement_ids: &'a [Uuid],
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  fn has_voted(
    &self,
    voter_id: Uuid,
    statement_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn vote_count(
    &self,
    statement_id: Uuid,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Ids of every statement `voter_id` currently endorses.
  fn votes_of(
    &self,
    voter_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Uuid>, Self::Error>> + Send + '_;

  // ── Card cache ──────────────────────────────────────────────────────────

  /// Replace every cached card of `statement_id` with `renders` atomically.
  ///
  /// Fails with [`crate::Error::StatementNotFound`] if the statement was
  /// deleted in the meantime.
  fn put_cards(
    &self,
    statement_id: Uuid,
    renders: Vec<CardRender>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// The cached card for `(statement_id, kind)`, if rendered.
  fn get_card(
    &self,
    statement_id: Uuid,
    kind: CardKind,
  ) -> impl Future<Output = Result<Option<CardRender>, Self::Error>> + Send + '_;
}

// ─── Render pipeline seams ───────────────────────────────────────────────────

/// Fire-and-forget queue of statements whose cards must be (re)rendered.
pub trait RenderQueue: Send + Sync {
  /// Schedule a render. Never blocks and never fails from the caller's
  /// perspective; delivery problems are the queue's to log.
  fn enqueue(&self, statement_id: Uuid);
}

/// External destination for rendered image bytes.
pub trait BlobSink: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Store `body` under `key`, overwriting any previous blob.
  fn put(
    &self,
    key: String,
    content_type: &'static str,
    body: Bytes,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
