//! Endorsement ("agree") results.
//!
//! A voter holds at most one vote along any root-to-leaf path. Voting for a
//! statement whose ancestor the voter already endorses is an ancestor
//! conflict: the caller must confirm before the ancestor votes are dropped.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Result of [`crate::store::StatementStore::toggle_vote`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ToggleOutcome {
  /// The voter now endorses the statement. `replaced` lists the ancestor
  /// votes that were removed in the same transaction.
  Voted {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    replaced: Vec<Uuid>,
  },
  /// The voter's existing endorsement was withdrawn.
  Unvoted,
  /// Nothing changed; the voter endorses ancestors of the target and must
  /// re-submit with confirmation.
  ConflictPending {
    statement_id:      Uuid,
    /// Content of every conflicting ancestor, nearest first.
    ancestor_contents: Vec<String>,
  },
}

impl ToggleOutcome {
  pub fn is_pending(&self) -> bool { matches!(self, Self::ConflictPending { .. }) }
}
