//! [`SqliteStore`], the SQLite implementation of [`StatementStore`].

use std::path::Path;

use agree_core::{
  card::{CardKind, CardRender},
  statement::{Content, NewStatement, RankedStatement, Statement},
  store::StatementStore,
  vote::ToggleOutcome,
};
use rusqlite::{OptionalExtension as _, TransactionBehavior, types::Value};
use uuid::Uuid;

use crate::{
  Result,
  encode::{
    RawCardRender, RawRanked, RawStatement, STATEMENT_COLUMNS, decode_uuid,
    encode_card_kind, encode_dt, encode_uuid, now,
  },
  schema::SCHEMA,
};

/// Domain outcome computed inside a database closure. Returning it as the
/// `Ok` payload lets the closure drop (and so roll back) an open transaction
/// while still reporting a domain error to the caller.
type Outcome<T> = std::result::Result<T, agree_core::Error>;

type DbResult<T> = tokio_rusqlite::Result<Outcome<T>>;

// ─── Store ───────────────────────────────────────────────────────────────────

/// An Agree store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. All calls
/// are funnelled through one connection thread, and every multi-statement
/// mutation additionally takes the write lock up front (`BEGIN IMMEDIATE`),
/// so concurrent processes sharing the file also serialise correctly.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Fail with `StatementNotFound` unless `id` exists.
  async fn require_statement(&self, id: Uuid) -> Result<()> {
    let id_str = encode_uuid(id);
    let exists = self
      .conn
      .call(move |conn| Ok(statement_exists(conn, &id_str)?))
      .await?;
    if !exists {
      return Err(agree_core::Error::StatementNotFound(id).into());
    }
    Ok(())
  }

  /// Run a query whose columns start with [`STATEMENT_COLUMNS`].
  async fn select_statements(
    &self,
    sql: String,
    args: Vec<Value>,
  ) -> Result<Vec<Statement>> {
    let raws: Vec<RawStatement> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(args), RawStatement::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawStatement::into_statement).collect()
  }

  /// Run a query whose columns are [`STATEMENT_COLUMNS`] followed by a score.
  async fn select_ranked(
    &self,
    sql: String,
    args: Vec<Value>,
  ) -> Result<Vec<RankedStatement>> {
    let raws: Vec<RawRanked> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(args), RawRanked::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRanked::into_ranked).collect()
  }

  async fn count(&self, sql: &'static str, id: Uuid) -> Result<u64> {
    let id_str = encode_uuid(id);
    let n: i64 = self
      .conn
      .call(move |conn| Ok(conn.query_row(sql, [id_str], |r| r.get(0))?))
      .await?;
    Ok(u64::try_from(n).unwrap_or_default())
  }
}

fn statement_exists(conn: &rusqlite::Connection, id: &str) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM statements WHERE statement_id = ?1",
        [id],
        |_| Ok(()),
      )
      .optional()?
      .is_some(),
  )
}

fn limit_value(limit: usize) -> Value {
  Value::Integer(i64::try_from(limit).unwrap_or(i64::MAX))
}

/// Escape `%`, `_` and `\` for use inside a `LIKE ... ESCAPE '\'` pattern.
fn like_pattern(text: &str) -> String {
  let mut out = String::with_capacity(text.len() + 2);
  out.push('%');
  for c in text.chars() {
    if matches!(c, '%' | '_' | '\\') {
      out.push('\\');
    }
    out.push(c);
  }
  out.push('%');
  out
}

/// Result of a toggle computed inside the vote transaction.
enum RawToggle {
  Voted(Vec<String>),
  Unvoted,
  Pending(Vec<String>),
}

// ─── StatementStore impl ─────────────────────────────────────────────────────

impl StatementStore for SqliteStore {
  type Error = crate::Error;

  // ── Statements ────────────────────────────────────────────────────────────

  async fn create_statement(&self, input: NewStatement) -> Result<Statement> {
    let statement = Statement {
      statement_id: Uuid::new_v4(),
      content:      input.content.into_inner(),
      author_id:    input.author_id,
      parent_id:    input.parent_id,
      created_at:   now(),
    };

    let id_str     = encode_uuid(statement.statement_id);
    let content    = statement.content.clone();
    let author_str = encode_uuid(statement.author_id);
    let parent     = statement.parent_id.map(|id| (id, encode_uuid(id)));
    let at_str     = encode_dt(statement.created_at);

    self
      .conn
      .call(move |conn| -> DbResult<()> {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if let Some((parent_id, parent_str)) = &parent
          && !statement_exists(&tx, parent_str)?
        {
          return Ok(Err(agree_core::Error::StatementNotFound(*parent_id)));
        }

        tx.execute(
          "INSERT INTO statements (statement_id, content, author_id, parent_id, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![
            id_str,
            content,
            author_str,
            parent.as_ref().map(|(_, s)| s.as_str()),
            at_str,
          ],
        )?;

        tx.execute(
          "INSERT INTO statement_hierarchies (ancestor_id, descendant_id, generations)
           VALUES (?1, ?1, 0)",
          [&id_str],
        )?;

        if let Some((_, parent_str)) = &parent {
          tx.execute(
            "INSERT INTO statement_hierarchies (ancestor_id, descendant_id, generations)
             SELECT ancestor_id, ?1, generations + 1
             FROM statement_hierarchies
             WHERE descendant_id = ?2",
            rusqlite::params![id_str, parent_str],
          )?;
        }

        tx.commit()?;
        Ok(Ok(()))
      })
      .await??;

    tracing::debug!(
      statement_id = %statement.statement_id,
      parent_id = ?statement.parent_id,
      "statement created"
    );
    Ok(statement)
  }

  async fn get_statement(&self, id: Uuid) -> Result<Option<Statement>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawStatement> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {STATEMENT_COLUMNS} FROM statements s WHERE s.statement_id = ?1"),
              [id_str],
              RawStatement::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawStatement::into_statement).transpose()
  }

  async fn update_content(&self, id: Uuid, content: Content) -> Result<Statement> {
    let id_str  = encode_uuid(id);
    let content = content.into_inner();

    let raw = self
      .conn
      .call(move |conn| -> DbResult<RawStatement> {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let changed = tx.execute(
          "UPDATE statements SET content = ?1 WHERE statement_id = ?2",
          rusqlite::params![content, id_str],
        )?;
        if changed == 0 {
          return Ok(Err(agree_core::Error::StatementNotFound(id)));
        }
        let raw = tx.query_row(
          &format!("SELECT {STATEMENT_COLUMNS} FROM statements s WHERE s.statement_id = ?1"),
          [&id_str],
          RawStatement::from_row,
        )?;
        tx.commit()?;
        Ok(Ok(raw))
      })
      .await??;

    raw.into_statement()
  }

  async fn delete_statement(&self, id: Uuid) -> Result<()> {
    let id_str = encode_uuid(id);

    self
      .conn
      .call(move |conn| -> DbResult<()> {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        if !statement_exists(&tx, &id_str)? {
          return Ok(Err(agree_core::Error::StatementNotFound(id)));
        }

        let has_children = tx
          .query_row(
            "SELECT 1 FROM statements WHERE parent_id = ?1 LIMIT 1",
            [&id_str],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if has_children {
          return Ok(Err(agree_core::Error::HasVariants(id)));
        }

        // Votes, closure rows and cached cards cascade.
        tx.execute("DELETE FROM statements WHERE statement_id = ?1", [&id_str])?;
        tx.commit()?;
        Ok(Ok(()))
      })
      .await??;

    tracing::debug!(statement_id = %id, "statement deleted");
    Ok(())
  }

  async fn list_statement_ids(&self) -> Result<Vec<Uuid>> {
    let ids: Vec<String> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare("SELECT statement_id FROM statements ORDER BY created_at, rowid")?;
        let rows = stmt
          .query_map([], |r| r.get(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    ids.iter().map(|s| decode_uuid(s)).collect()
  }

  // ── Hierarchy ─────────────────────────────────────────────────────────────

  async fn children_of(&self, id: Uuid) -> Result<Vec<Statement>> {
    self.require_statement(id).await?;
    self
      .select_statements(
        format!(
          "SELECT {STATEMENT_COLUMNS} FROM statements s
           WHERE s.parent_id = ?1
           ORDER BY s.created_at, s.rowid"
        ),
        vec![Value::Text(encode_uuid(id))],
      )
      .await
  }

  async fn ancestors_of(&self, id: Uuid) -> Result<Vec<Statement>> {
    self.require_statement(id).await?;
    self
      .select_statements(
        format!(
          "SELECT {STATEMENT_COLUMNS}
           FROM statement_hierarchies h
           JOIN statements s ON s.statement_id = h.ancestor_id
           WHERE h.descendant_id = ?1 AND h.generations > 0
           ORDER BY h.generations"
        ),
        vec![Value::Text(encode_uuid(id))],
      )
      .await
  }

  async fn descendants_of(&self, id: Uuid) -> Result<Vec<Statement>> {
    self.require_statement(id).await?;
    self
      .select_statements(
        format!(
          "SELECT {STATEMENT_COLUMNS}
           FROM statement_hierarchies h
           JOIN statements s ON s.statement_id = h.descendant_id
           WHERE h.ancestor_id = ?1 AND h.generations > 0
           ORDER BY h.generations, s.created_at, s.rowid"
        ),
        vec![Value::Text(encode_uuid(id))],
      )
      .await
  }

  async fn descendant_count(&self, id: Uuid) -> Result<u64> {
    self.require_statement(id).await?;
    self
      .count(
        "SELECT COUNT(*) FROM statement_hierarchies
         WHERE ancestor_id = ?1 AND generations > 0",
        id,
      )
      .await
  }

  // ── Rankings ──────────────────────────────────────────────────────────────

  async fn top_by_votes(&self, limit: usize) -> Result<Vec<RankedStatement>> {
    self
      .select_ranked(
        format!(
          "SELECT {STATEMENT_COLUMNS}, COUNT(v.voter_id) AS score
           FROM statements s
           LEFT JOIN votes v ON v.statement_id = s.statement_id
           GROUP BY s.statement_id
           ORDER BY score DESC, s.created_at DESC, s.rowid DESC
           LIMIT ?1"
        ),
        vec![limit_value(limit)],
      )
      .await
  }

  async fn top_by_descendants(&self, limit: usize) -> Result<Vec<RankedStatement>> {
    self
      .select_ranked(
        format!(
          "SELECT {STATEMENT_COLUMNS}, COUNT(*) AS score
           FROM statements s
           JOIN statement_hierarchies h
             ON h.ancestor_id = s.statement_id AND h.generations > 0
           GROUP BY s.statement_id
           ORDER BY score DESC, s.created_at DESC, s.rowid DESC
           LIMIT ?1"
        ),
        vec![limit_value(limit)],
      )
      .await
  }

  async fn most_recent(&self, limit: usize) -> Result<Vec<Statement>> {
    self
      .select_statements(
        format!(
          "SELECT {STATEMENT_COLUMNS} FROM statements s
           ORDER BY s.created_at DESC, s.rowid DESC
           LIMIT ?1"
        ),
        vec![limit_value(limit)],
      )
      .await
  }

  async fn search(&self, text: &str, limit: usize) -> Result<Vec<Statement>> {
    self
      .select_statements(
        format!(
          "SELECT {STATEMENT_COLUMNS} FROM statements s
           WHERE s.content LIKE ?1 ESCAPE '\\'
           ORDER BY s.created_at DESC, s.rowid DESC
           LIMIT ?2"
        ),
        vec![Value::Text(like_pattern(text)), limit_value(limit)],
      )
      .await
  }

  // ── Votes ─────────────────────────────────────────────────────────────────

  async fn toggle_vote(
    &self,
    voter_id: Uuid,
    statement_id: Uuid,
    confirmed: bool,
  ) -> Result<ToggleOutcome> {
    let voter_str     = encode_uuid(voter_id);
    let statement_str = encode_uuid(statement_id);
    let at_str        = encode_dt(now());

    let raw = self
      .conn
      .call(move |conn| -> DbResult<RawToggle> {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        if !statement_exists(&tx, &statement_str)? {
          return Ok(Err(agree_core::Error::StatementNotFound(statement_id)));
        }

        let removed = tx.execute(
          "DELETE FROM votes WHERE voter_id = ?1 AND statement_id = ?2",
          rusqlite::params![voter_str, statement_str],
        )?;
        if removed > 0 {
          tx.commit()?;
          return Ok(Ok(RawToggle::Unvoted));
        }

        let conflicting: Vec<(String, String)> = {
          let mut stmt = tx.prepare(
            "SELECT s.statement_id, s.content
             FROM statement_hierarchies h
             JOIN votes v
               ON v.statement_id = h.ancestor_id AND v.voter_id = ?2
             JOIN statements s ON s.statement_id = h.ancestor_id
             WHERE h.descendant_id = ?1 AND h.generations > 0
             ORDER BY h.generations",
          )?;
          stmt
            .query_map(rusqlite::params![statement_str, voter_str], |r| {
              Ok((r.get(0)?, r.get(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };

        if !conflicting.is_empty() && !confirmed {
          // Dropping `tx` rolls back; nothing was written.
          let contents = conflicting.into_iter().map(|(_, c)| c).collect();
          return Ok(Ok(RawToggle::Pending(contents)));
        }

        tx.execute(
          "DELETE FROM votes
           WHERE voter_id = ?1
             AND statement_id IN (
               SELECT ancestor_id FROM statement_hierarchies
               WHERE descendant_id = ?2 AND generations > 0
             )",
          rusqlite::params![voter_str, statement_str],
        )?;
        tx.execute(
          "INSERT INTO votes (voter_id, statement_id, created_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![voter_str, statement_str, at_str],
        )?;
        tx.commit()?;

        Ok(Ok(RawToggle::Voted(
          conflicting.into_iter().map(|(id, _)| id).collect(),
        )))
      })
      .await??;

    let outcome = match raw {
      RawToggle::Unvoted => ToggleOutcome::Unvoted,
      RawToggle::Voted(replaced) => ToggleOutcome::Voted {
        replaced: replaced.iter().map(|s| decode_uuid(s)).collect::<Result<_>>()?,
      },
      RawToggle::Pending(ancestor_contents) => ToggleOutcome::ConflictPending {
        statement_id,
        ancestor_contents,
      },
    };

    tracing::debug!(%voter_id, %statement_id, confirmed, ?outcome, "vote toggled");
    Ok(outcome)
  }

  async fn reconcile_votes(&self, voter_id: Uuid, statement_ids: &[Uuid]) -> Result<u64> {
    let voter_str = encode_uuid(voter_id);
    let ids: Vec<String> = statement_ids.iter().copied().map(encode_uuid).collect();
    let at_str = encode_dt(now());

    let added = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut added: u64 = 0;
        for id in &ids {
          if !statement_exists(&tx, id)? {
            continue;
          }
          let inserted = tx.execute(
            "INSERT OR IGNORE INTO votes (voter_id, statement_id, created_at)
             VALUES (?1, ?2, ?3)",
            rusqlite::params![voter_str, id, at_str],
          )?;
          added += inserted as u64;
        }
        tx.commit()?;
        Ok(added)
      })
      .await?;

    tracing::debug!(%voter_id, requested = statement_ids.len(), added, "votes reconciled");
    Ok(added)
  }

  async fn has_voted(&self, voter_id: Uuid, statement_id: Uuid) -> Result<bool> {
    let voter_str     = encode_uuid(voter_id);
    let statement_str = encode_uuid(statement_id);

    let voted = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM votes WHERE voter_id = ?1 AND statement_id = ?2",
              rusqlite::params![voter_str, statement_str],
              |_| Ok(()),
            )
            .optional()?
            .is_some(),
        )
      })
      .await?;
    Ok(voted)
  }

  async fn vote_count(&self, statement_id: Uuid) -> Result<u64> {
    self
      .count("SELECT COUNT(*) FROM votes WHERE statement_id = ?1", statement_id)
      .await
  }

  async fn votes_of(&self, voter_id: Uuid) -> Result<Vec<Uuid>> {
    let voter_str = encode_uuid(voter_id);

    let ids: Vec<String> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT statement_id FROM votes WHERE voter_id = ?1 ORDER BY created_at, rowid",
        )?;
        let rows = stmt
          .query_map([voter_str], |r| r.get(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    ids.iter().map(|s| decode_uuid(s)).collect()
  }

  // ── Card cache ────────────────────────────────────────────────────────────

  async fn put_cards(&self, statement_id: Uuid, renders: Vec<CardRender>) -> Result<()> {
    let statement_str = encode_uuid(statement_id);
    let rows: Vec<(String, String, Vec<u8>, String, String)> = renders
      .into_iter()
      .map(|r| {
        (
          encode_card_kind(r.kind),
          r.content_type,
          r.body,
          r.etag,
          encode_dt(r.rendered_at),
        )
      })
      .collect();

    self
      .conn
      .call(move |conn| -> DbResult<()> {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        if !statement_exists(&tx, &statement_str)? {
          return Ok(Err(agree_core::Error::StatementNotFound(statement_id)));
        }

        tx.execute("DELETE FROM card_renders WHERE statement_id = ?1", [&statement_str])?;
        for (kind, content_type, body, etag, rendered_at) in &rows {
          tx.execute(
            "INSERT INTO card_renders (statement_id, kind, content_type, body, etag, rendered_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![statement_str, kind, content_type, body, etag, rendered_at],
          )?;
        }
        tx.commit()?;
        Ok(Ok(()))
      })
      .await??;
    Ok(())
  }

  async fn get_card(&self, statement_id: Uuid, kind: CardKind) -> Result<Option<CardRender>> {
    let statement_str = encode_uuid(statement_id);
    let kind_str      = encode_card_kind(kind);

    let raw: Option<RawCardRender> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT statement_id, kind, content_type, body, etag, rendered_at
               FROM card_renders
               WHERE statement_id = ?1 AND kind = ?2",
              rusqlite::params![statement_str, kind_str],
              |row| {
                Ok(RawCardRender {
                  statement_id: row.get(0)?,
                  kind:         row.get(1)?,
                  content_type: row.get(2)?,
                  body:         row.get(3)?,
                  etag:         row.get(4)?,
                  rendered_at:  row.get(5)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawCardRender::into_render).transpose()
  }
}
