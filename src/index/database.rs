//! SQLite-backed index store.
//!
//! # Schema
//!
//! One table, compatible with databases written by earlier ebook index tools:
//!
//! ```sql
//! CREATE TABLE ebookinfo (
//!     id   INTEGER PRIMARY KEY AUTOINCREMENT,
//!     path VARCHAR(1024) NOT NULL,
//!     hash VARCHAR(128)  NOT NULL
//! );
//! ```
//!
//! The digest column carries no uniqueness constraint. One path per digest
//! is maintained by the engine, and duplicate rows found at load time are
//! resolved by [`Index::from_records`](super::Index::from_records).

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection};
use thiserror::Error;

use super::IndexedFile;
use crate::scanner::path_utils::path_to_record;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS "ebookinfo" (
    'id' INTEGER PRIMARY KEY AUTOINCREMENT,
    'path' VARCHAR(1024) NOT NULL,
    'hash' VARCHAR(128) NOT NULL
);
CREATE INDEX IF NOT EXISTS "ebookinfo_path" ON "ebookinfo" ("path");
"#;

/// Errors raised by the durable store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The database file could not be opened.
    #[error("failed to open index database {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// The table could not be created or verified.
    #[error("failed to initialize index schema: {0}")]
    Schema(#[source] rusqlite::Error),

    /// Reading records failed.
    #[error("failed to read index records: {0}")]
    Query(#[source] rusqlite::Error),

    /// Writing or deleting a record failed.
    #[error("failed to update index record for {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Durable digest → path mapping.
///
/// Implementations must create their backing storage on first use.
pub trait IndexStore {
    /// Every recorded entry, oldest first.
    fn load(&self) -> StoreResult<Vec<IndexedFile>>;

    /// Insert a record, replacing any existing record for the same path.
    fn record(&mut self, file: &IndexedFile) -> StoreResult<()>;

    /// Remove all records for a path. Returns the number of rows removed.
    fn forget(&mut self, path: &Path) -> StoreResult<usize>;
}

/// SQLite implementation of [`IndexStore`].
pub struct SqliteIndexStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl std::fmt::Debug for SqliteIndexStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteIndexStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl SqliteIndexStore {
    /// Open (creating if needed) the index database at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Open`] if the file cannot be opened and
    /// [`StoreError::Schema`] if it is not a usable SQLite database.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path).map_err(|source| StoreError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self {
            conn,
            path: Some(path.to_path_buf()),
        };
        store.init_schema()?;
        log::debug!("Opened index database at {}", path.display());
        Ok(store)
    }

    /// Open a private in-memory database (used for dry runs and tests).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if SQLite cannot allocate the database.
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory().map_err(|source| StoreError::Open {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        let store = Self { conn, path: None };
        store.init_schema()?;
        Ok(store)
    }

    /// Location of the database file, if it is file-backed.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Total number of rows in the table.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Query`] if the count fails.
    pub fn row_count(&self) -> StoreResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM ebookinfo", [], |row| row.get(0))
            .map_err(StoreError::Query)?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Create the table if it does not exist yet. Idempotent.
    fn init_schema(&self) -> StoreResult<()> {
        self.conn.execute_batch(SCHEMA).map_err(StoreError::Schema)
    }
}

impl IndexStore for SqliteIndexStore {
    fn load(&self) -> StoreResult<Vec<IndexedFile>> {
        let mut stmt = self
            .conn
            .prepare("SELECT path, hash FROM ebookinfo ORDER BY id")
            .map_err(StoreError::Query)?;

        let rows = stmt
            .query_map([], |row| {
                let path: String = row.get(0)?;
                let digest: String = row.get(1)?;
                Ok(IndexedFile::new(path, digest))
            })
            .map_err(StoreError::Query)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(StoreError::Query)?;

        log::debug!("Loaded {} index records", rows.len());
        Ok(rows)
    }

    fn record(&mut self, file: &IndexedFile) -> StoreResult<()> {
        let path = path_to_record(&file.path);
        let write_err = |source: rusqlite::Error| StoreError::Write {
            path: file.path.clone(),
            source,
        };

        let tx = self.conn.transaction().map_err(write_err)?;
        tx.execute("DELETE FROM ebookinfo WHERE path = ?1", params![path])
            .map_err(write_err)?;
        tx.execute(
            "INSERT INTO ebookinfo (path, hash) VALUES (?1, ?2)",
            params![path, file.digest],
        )
        .map_err(write_err)?;
        tx.commit().map_err(write_err)?;

        log::trace!("Recorded {} -> {}", file.digest, path);
        Ok(())
    }

    fn forget(&mut self, path: &Path) -> StoreResult<usize> {
        let removed = self
            .conn
            .execute(
                "DELETE FROM ebookinfo WHERE path = ?1",
                params![path_to_record(path)],
            )
            .map_err(|source| StoreError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        log::trace!("Forgot {} row(s) for {}", removed, path.display());
        Ok(removed)
    }
}
