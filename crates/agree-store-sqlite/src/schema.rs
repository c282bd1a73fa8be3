//! SQL schema for the Agree SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS statements (
    statement_id TEXT PRIMARY KEY,
    content      TEXT NOT NULL CHECK (length(trim(content)) > 0),
    author_id    TEXT NOT NULL,
    parent_id    TEXT REFERENCES statements(statement_id),
    created_at   TEXT NOT NULL    -- fixed-width RFC 3339 UTC; sorts lexically
);

-- Closure index: one row per (ancestor, descendant) pair, including the
-- zero-generation self pair. Rows are only ever added when a statement is
-- inserted and removed when it is deleted; statements are never reparented.
CREATE TABLE IF NOT EXISTS statement_hierarchies (
    ancestor_id   TEXT    NOT NULL REFERENCES statements(statement_id) ON DELETE CASCADE,
    descendant_id TEXT    NOT NULL REFERENCES statements(statement_id) ON DELETE CASCADE,
    generations   INTEGER NOT NULL,
    PRIMARY KEY (ancestor_id, descendant_id)
);

CREATE TABLE IF NOT EXISTS votes (
    voter_id     TEXT NOT NULL,
    statement_id TEXT NOT NULL REFERENCES statements(statement_id) ON DELETE CASCADE,
    created_at   TEXT NOT NULL,
    PRIMARY KEY (voter_id, statement_id)
);

-- One rendering per (statement, kind); replaced wholesale on re-render.
CREATE TABLE IF NOT EXISTS card_renders (
    statement_id TEXT NOT NULL REFERENCES statements(statement_id) ON DELETE CASCADE,
    kind         TEXT NOT NULL,   -- 'square' | 'social' | 'dark-square' | 'dark-social' | 'og'
    content_type TEXT NOT NULL,
    body         BLOB NOT NULL,
    etag         TEXT NOT NULL,
    rendered_at  TEXT NOT NULL,
    PRIMARY KEY (statement_id, kind)
);

CREATE INDEX IF NOT EXISTS statements_parent_idx      ON statements(parent_id);
CREATE INDEX IF NOT EXISTS statements_created_idx     ON statements(created_at);
CREATE INDEX IF NOT EXISTS hierarchies_descendant_idx ON statement_hierarchies(descendant_id, generations);
CREATE INDEX IF NOT EXISTS votes_statement_idx        ON votes(statement_id);

PRAGMA user_version = 1;
";
