//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings with a fixed microsecond
//! precision so that lexical and chronological order agree. UUIDs are stored
//! as hyphenated lowercase strings.

use agree_core::{
  card::{CardKind, CardRender},
  statement::{RankedStatement, Statement},
};
use chrono::{DateTime, SecondsFormat, SubsecRound as _, Utc};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

/// The current time, truncated to the precision [`encode_dt`] keeps, so a
/// value built in memory equals the one later read back.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── CardKind ────────────────────────────────────────────────────────────────

pub fn encode_card_kind(kind: CardKind) -> String { kind.to_string() }

pub fn decode_card_kind(s: &str) -> Result<CardKind> {
  s.parse().map_err(|_| Error::Corrupt {
    column: "card_renders.kind",
    value:  s.to_owned(),
  })
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawStatement::from_row`], for a `statements s` alias.
pub const STATEMENT_COLUMNS: &str =
  "s.statement_id, s.content, s.author_id, s.parent_id, s.created_at";

/// Raw strings read directly from a `statements` row.
pub struct RawStatement {
  pub statement_id: String,
  pub content:      String,
  pub author_id:    String,
  pub parent_id:    Option<String>,
  pub created_at:   String,
}

impl RawStatement {
  /// Read the first five columns as selected by [`STATEMENT_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      statement_id: row.get(0)?,
      content:      row.get(1)?,
      author_id:    row.get(2)?,
      parent_id:    row.get(3)?,
      created_at:   row.get(4)?,
    })
  }

  pub fn into_statement(self) -> Result<Statement> {
    Ok(Statement {
      statement_id: decode_uuid(&self.statement_id)?,
      content:      self.content,
      author_id:    decode_uuid(&self.author_id)?,
      parent_id:    self.parent_id.as_deref().map(decode_uuid).transpose()?,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

/// A statement row followed by an integer score column.
pub struct RawRanked {
  pub statement: RawStatement,
  pub score:     i64,
}

impl RawRanked {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      statement: RawStatement::from_row(row)?,
      score:     row.get(5)?,
    })
  }

  pub fn into_ranked(self) -> Result<RankedStatement> {
    Ok(RankedStatement {
      statement: self.statement.into_statement()?,
      score:     u64::try_from(self.score).unwrap_or_default(),
    })
  }
}

/// Raw values read directly from a `card_renders` row.
pub struct RawCardRender {
  pub statement_id: String,
  pub kind:         String,
  pub content_type: String,
  pub body:         Vec<u8>,
  pub etag:         String,
  pub rendered_at:  String,
}

impl RawCardRender {
  pub fn into_render(self) -> Result<CardRender> {
    Ok(CardRender {
      statement_id: decode_uuid(&self.statement_id)?,
      kind:         decode_card_kind(&self.kind)?,
      content_type: self.content_type,
      body:         self.body,
      etag:         self.etag,
      rendered_at:  decode_dt(&self.rendered_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn timestamps_sort_lexically() {
    let early = Utc.timestamp_opt(1_700_000_000, 5_000).unwrap();
    let late = Utc.timestamp_opt(1_700_000_000, 120_000_000).unwrap();
    assert!(encode_dt(early) < encode_dt(late));
    assert_eq!(encode_dt(early).len(), encode_dt(late).len());
    assert_eq!(decode_dt(&encode_dt(late)).unwrap(), late);
  }

  #[test]
  fn now_survives_round_trip() {
    let at = now();
    assert_eq!(decode_dt(&encode_dt(at)).unwrap(), at);
  }

  #[test]
  fn unknown_card_kind_is_corrupt() {
    assert!(matches!(
      decode_card_kind("sepia"),
      Err(Error::Corrupt { column: "card_renders.kind", .. })
    ));
  }
}
