//! Statements, the nodes of the agreement tree.
//!
//! A statement is either a root claim or a variant that refines its parent.
//! The parent link is fixed at creation, so the parent graph can only grow
//! by adding leaves and is acyclic by construction.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, normalize::normalize};

// ─── Content ─────────────────────────────────────────────────────────────────

/// Normalised, non-blank statement text.
///
/// The only way to obtain a `Content` is [`Content::parse`], so holding one
/// proves the text has been through the normaliser and passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Content(String);

impl Content {
  /// Normalise `raw` and reject it if nothing but whitespace remains.
  pub fn parse(raw: &str) -> Result<Self> {
    let text = normalize(raw);
    if text.trim().is_empty() {
      return Err(Error::validation("content", "can't be blank"));
    }
    Ok(Self(text))
  }

  pub fn as_str(&self) -> &str { &self.0 }

  pub fn into_inner(self) -> String { self.0 }
}

impl fmt::Display for Content {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

// ─── Statement ───────────────────────────────────────────────────────────────

/// A persisted statement. `author_id` and `parent_id` never change after
/// creation; only `content` may be edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
  pub statement_id: Uuid,
  pub content:      String,
  pub author_id:    Uuid,
  /// `None` for root statements.
  pub parent_id:    Option<Uuid>,
  /// Server-assigned; default ordering among siblings.
  pub created_at:   DateTime<Utc>,
}

impl Statement {
  pub fn is_root(&self) -> bool { self.parent_id.is_none() }
}

/// Input to [`crate::store::StatementStore::create_statement`].
/// The identifier and `created_at` are always assigned by the store.
#[derive(Debug, Clone)]
pub struct NewStatement {
  pub content:   Content,
  pub author_id: Uuid,
  pub parent_id: Option<Uuid>,
}

impl NewStatement {
  /// A root statement.
  pub fn root(content: Content, author_id: Uuid) -> Self {
    Self { content, author_id, parent_id: None }
  }

  /// A variant refining `parent_id`.
  pub fn variant(content: Content, author_id: Uuid, parent_id: Uuid) -> Self {
    Self { content, author_id, parent_id: Some(parent_id) }
  }
}

/// A statement paired with the metric it was ranked by (vote count or
/// descendant count).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedStatement {
  #[serde(flatten)]
  pub statement: Statement,
  pub score:     u64,
}
