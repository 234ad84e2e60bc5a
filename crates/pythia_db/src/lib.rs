//! Persistent store for the Pythia indexer.
//!
//! A single SQLite database maps absolute paths to [`Folder`] and
//! [`FileRecord`] rows. The pool is cheap to clone and safe to share
//! across crawl workers; each statement runs as its own transaction.
//!
//! # Usage
//!
//! ```rust,ignore
//! use pythia_db::{Store, Folder};
//!
//! let store = Store::open("~/.pythia/pythia.sqlite3").await?;
//! let mut folder = Folder::new("/data/books");
//! store.folder_add(&mut folder).await?;
//! let files = store.file_get_by_folder(folder.id).await?;
//! ```

mod error;
mod schema;
mod store;
mod types;

pub use error::{Result, StoreError};
pub use types::{suffix, ContentType, FileRecord, Folder};

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use tracing::info;

/// Handle to the SQLite store.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open or create a database at the given path.
    ///
    /// Creates all tables if they don't exist. Failure here is fatal to
    /// a crawl; callers propagate it rather than retrying.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.ensure_schema().await?;

        info!(path = %path.display(), "Store opened");

        Ok(store)
    }

    /// Open an existing database (fails if not exists).
    pub async fn open_existing(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(StoreError::NotFound(format!(
                "Database not found: {}",
                path.display()
            )));
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))?
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.ensure_schema().await?;

        Ok(store)
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub(crate) fn to_millis(ts: DateTime<Utc>) -> i64 {
        ts.timestamp_millis()
    }

    pub(crate) fn from_millis(millis: i64) -> Result<DateTime<Utc>> {
        DateTime::from_timestamp_millis(millis)
            .ok_or_else(|| StoreError::Corrupt(format!("Invalid timestamp: {millis}")))
    }
}
