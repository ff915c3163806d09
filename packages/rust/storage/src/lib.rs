//! libSQL storage layer for imported search indexes.
//!
//! The [`Storage`] struct wraps a local libSQL database holding named
//! indexes, their entries in order, and an FTS5 table over entry titles
//! and text.
//!
//! **Access rules:**
//! - `docindex db import` / `db remove`: read-write via [`Storage::open`]
//! - everything else: read-only via [`Storage::open_readonly`]

mod migrations;

use std::path::Path;

use chrono::{DateTime, Utc};
use docindex_core::search::tokenize;
use docindex_shared::{Category, DocEntry, DocIndexError, Result, SearchIndex};
use libsql::{Connection, Database, params};
use serde::Serialize;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
    readonly: bool,
}

/// Metadata for an imported index.
#[derive(Debug, Clone, Serialize)]
pub struct StoredIndex {
    pub id: String,
    pub name: String,
    /// File the index was imported from.
    pub source_path: String,
    /// Fingerprint of the imported entries (see `docindex_core::fingerprint`).
    pub fingerprint: String,
    pub entry_count: usize,
    pub imported_at: DateTime<Utc>,
}

/// What `import_index` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    /// No index of that name existed.
    Created { id: String, entries: usize },
    /// The previous generation was replaced wholesale.
    Replaced { id: String, entries: usize },
    /// The stored fingerprint matched; nothing was written.
    Unchanged { id: String },
}

/// A full-text search result.
#[derive(Debug, Clone, Serialize)]
pub struct StoredHit {
    pub location: String,
    pub page: String,
    pub title: String,
    pub category: String,
    /// bm25 rank (lower is better).
    pub score: f64,
}

fn storage_err(e: libsql::Error) -> DocIndexError {
    DocIndexError::Storage(e.to_string())
}

impl Storage {
    /// Open or create a database at `path` in read-write mode.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| DocIndexError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(storage_err)?;
        let conn = db.connect().map_err(storage_err)?;

        let storage = Self {
            db,
            conn,
            readonly: false,
        };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Open an existing database at `path` in read-only mode.
    pub async fn open_readonly(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(DocIndexError::Storage(format!(
                "database not found at {}; import an index first",
                path.display()
            )));
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(storage_err)?;
        let conn = db.connect().map_err(storage_err)?;

        Ok(Self {
            db,
            conn,
            readonly: true,
        })
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn.execute_batch(migration.sql).await.map_err(|e| {
                    DocIndexError::Storage(format!(
                        "migration v{} failed: {e}",
                        migration.version
                    ))
                })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    /// Ensure we're in read-write mode before writing.
    fn check_writable(&self) -> Result<()> {
        if self.readonly {
            return Err(DocIndexError::Storage(
                "database is opened in read-only mode".into(),
            ));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Index operations
    // -----------------------------------------------------------------------

    /// Store `index` under `name`, replacing any previous generation.
    ///
    /// Skips the write when the stored fingerprint is identical.
    #[instrument(skip_all, fields(name = %name, entries = index.len()))]
    pub async fn import_index(
        &self,
        name: &str,
        source_path: &str,
        index: &SearchIndex,
    ) -> Result<ImportOutcome> {
        self.check_writable()?;
        let fingerprint = docindex_core::fingerprint(index)?;

        let existing = self.get_index(name).await?;
        if let Some(stored) = &existing {
            if stored.fingerprint == fingerprint {
                debug!(id = %stored.id, "fingerprint unchanged, skipping import");
                return Ok(ImportOutcome::Unchanged {
                    id: stored.id.clone(),
                });
            }
        }

        let id = Uuid::now_v7().to_string();
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction().await.map_err(storage_err)?;

        if let Some(stored) = &existing {
            tx.execute(
                "DELETE FROM entries WHERE index_id = ?1",
                params![stored.id.as_str()],
            )
            .await
            .map_err(storage_err)?;
            tx.execute("DELETE FROM indexes WHERE id = ?1", params![stored.id.as_str()])
                .await
                .map_err(storage_err)?;
        }

        tx.execute(
            "INSERT INTO indexes (id, name, source_path, fingerprint, entry_count, imported_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                id.as_str(),
                name,
                source_path,
                fingerprint.as_str(),
                index.len() as i64,
                now.as_str()
            ],
        )
        .await
        .map_err(storage_err)?;

        for (position, entry) in index.iter().enumerate() {
            tx.execute(
                "INSERT INTO entries (index_id, position, location, page, title, category, text)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    id.as_str(),
                    position as i64,
                    entry.location.as_str(),
                    entry.page.as_str(),
                    entry.title.as_str(),
                    entry.category.as_str(),
                    entry.text.as_str()
                ],
            )
            .await
            .map_err(|e| {
                DocIndexError::Storage(format!("inserting {}: {e}", entry.location))
            })?;
        }

        tx.commit().await.map_err(storage_err)?;

        info!(%id, name, entries = index.len(), "imported search index");

        Ok(match existing {
            Some(_) => ImportOutcome::Replaced {
                id,
                entries: index.len(),
            },
            None => ImportOutcome::Created {
                id,
                entries: index.len(),
            },
        })
    }

    /// Get an imported index by name.
    pub async fn get_index(&self, name: &str) -> Result<Option<StoredIndex>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, name, source_path, fingerprint, entry_count, imported_at
                 FROM indexes WHERE name = ?1",
                params![name],
            )
            .await
            .map_err(storage_err)?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_stored_index(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(storage_err(e)),
        }
    }

    /// List all imported indexes by name.
    pub async fn list_indexes(&self) -> Result<Vec<StoredIndex>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, name, source_path, fingerprint, entry_count, imported_at
                 FROM indexes ORDER BY name",
                params![],
            )
            .await
            .map_err(storage_err)?;

        let mut results = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            results.push(row_to_stored_index(&row)?);
        }
        Ok(results)
    }

    /// Load the entries of an imported index, in their original order.
    pub async fn load_entries(&self, name: &str) -> Result<SearchIndex> {
        let stored = self
            .get_index(name)
            .await?
            .ok_or_else(|| DocIndexError::Storage(format!("no index named '{name}'")))?;

        let mut rows = self
            .conn
            .query(
                "SELECT location, page, title, category, text
                 FROM entries WHERE index_id = ?1 ORDER BY position",
                params![stored.id.as_str()],
            )
            .await
            .map_err(storage_err)?;

        let mut docs = Vec::with_capacity(stored.entry_count);
        while let Ok(Some(row)) = rows.next().await {
            docs.push(DocEntry {
                location: row.get::<String>(0).map_err(storage_err)?.into(),
                page: row.get::<String>(1).map_err(storage_err)?,
                title: row.get::<String>(2).map_err(storage_err)?,
                category: Category::from(row.get::<String>(3).map_err(storage_err)?),
                text: row.get::<String>(4).map_err(storage_err)?,
            });
        }
        Ok(SearchIndex::new(docs))
    }

    /// Remove an imported index. Returns whether it existed.
    pub async fn delete_index(&self, name: &str) -> Result<bool> {
        self.check_writable()?;
        let Some(stored) = self.get_index(name).await? else {
            return Ok(false);
        };

        let tx = self.conn.transaction().await.map_err(storage_err)?;
        tx.execute(
            "DELETE FROM entries WHERE index_id = ?1",
            params![stored.id.as_str()],
        )
        .await
        .map_err(storage_err)?;
        tx.execute("DELETE FROM indexes WHERE id = ?1", params![stored.id.as_str()])
            .await
            .map_err(storage_err)?;
        tx.commit().await.map_err(storage_err)?;

        info!(name, "removed search index");
        Ok(true)
    }

    // -----------------------------------------------------------------------
    // FTS search
    // -----------------------------------------------------------------------

    /// Full-text search within one imported index, best matches first.
    pub async fn search(&self, name: &str, query: &str, limit: u32) -> Result<Vec<StoredHit>> {
        let Some(fts_query) = fts_query(query) else {
            return Ok(Vec::new());
        };

        let mut rows = self
            .conn
            .query(
                "SELECT e.location, e.page, e.title, e.category, bm25(entries_fts, 3.0, 1.0) AS score
                 FROM entries_fts
                 JOIN entries e ON e.id = entries_fts.rowid
                 JOIN indexes i ON i.id = e.index_id
                 WHERE entries_fts MATCH ?1 AND i.name = ?2
                 ORDER BY score, e.position
                 LIMIT ?3",
                params![fts_query.as_str(), name, limit],
            )
            .await
            .map_err(storage_err)?;

        let mut results = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            results.push(StoredHit {
                location: row.get::<String>(0).map_err(storage_err)?,
                page: row.get::<String>(1).map_err(storage_err)?,
                title: row.get::<String>(2).map_err(storage_err)?,
                category: row.get::<String>(3).map_err(storage_err)?,
                score: row.get::<f64>(4).unwrap_or(0.0),
            });
        }
        Ok(results)
    }
}

/// Turn user input into quoted FTS5 prefix terms joined by AND.
///
/// Quoting every term keeps FTS operators in the input (`OR`, `NEAR`, `*`,
/// column filters) from being interpreted.
fn fts_query(query: &str) -> Option<String> {
    let terms: Vec<String> = tokenize(query)
        .into_iter()
        .map(|t| format!("\"{}\"*", t.replace('"', "\"\"")))
        .collect();
    (!terms.is_empty()).then(|| terms.join(" "))
}

/// Convert a database row to a [`StoredIndex`].
fn row_to_stored_index(row: &libsql::Row) -> Result<StoredIndex> {
    Ok(StoredIndex {
        id: row.get::<String>(0).map_err(storage_err)?,
        name: row.get::<String>(1).map_err(storage_err)?,
        source_path: row.get::<String>(2).map_err(storage_err)?,
        fingerprint: row.get::<String>(3).map_err(storage_err)?,
        entry_count: row.get::<i64>(4).map_err(storage_err)? as usize,
        imported_at: {
            let s: String = row.get(5).map_err(storage_err)?;
            DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| DocIndexError::Storage(format!("invalid date: {e}")))?
        },
    })
}
