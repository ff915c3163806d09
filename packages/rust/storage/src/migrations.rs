//! SQL migration definitions for the docindex database.
//!
//! Migrations are applied in order on database open. Each migration has a
//! version number and a batch of SQL statements.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial schema: indexes, entries, FTS5",
        sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version    INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- One row per imported search index
CREATE TABLE IF NOT EXISTS indexes (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL UNIQUE,
    source_path TEXT NOT NULL,
    fingerprint TEXT NOT NULL,
    entry_count INTEGER NOT NULL,
    imported_at TEXT NOT NULL
);

-- Entries, in index order
CREATE TABLE IF NOT EXISTS entries (
    id       INTEGER PRIMARY KEY AUTOINCREMENT,
    index_id TEXT NOT NULL REFERENCES indexes(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    location TEXT NOT NULL,
    page     TEXT NOT NULL,
    title    TEXT NOT NULL,
    category TEXT NOT NULL,
    text     TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_entries_index_position ON entries(index_id, position);

-- Full-text search on entry titles and text
CREATE VIRTUAL TABLE IF NOT EXISTS entries_fts USING fts5(
    title,
    text,
    content=entries,
    content_rowid=id
);

-- Triggers to keep FTS in sync with entries table
CREATE TRIGGER IF NOT EXISTS entries_fts_insert AFTER INSERT ON entries BEGIN
    INSERT INTO entries_fts(rowid, title, text)
    VALUES (new.id, new.title, new.text);
END;

CREATE TRIGGER IF NOT EXISTS entries_fts_delete AFTER DELETE ON entries BEGIN
    INSERT INTO entries_fts(entries_fts, rowid, title, text)
    VALUES ('delete', old.id, old.title, old.text);
END;

CREATE TRIGGER IF NOT EXISTS entries_fts_update AFTER UPDATE ON entries BEGIN
    INSERT INTO entries_fts(entries_fts, rowid, title, text)
    VALUES ('delete', old.id, old.title, old.text);
    INSERT INTO entries_fts(rowid, title, text)
    VALUES (new.id, new.title, new.text);
END;

INSERT INTO schema_migrations (version) VALUES (1);
"#,
    }]
}
