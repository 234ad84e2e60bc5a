//! Schema creation for the Pythia store.
//!
//! All CREATE TABLE statements live here - single source of truth.
//!
//! Timestamps are INTEGER milliseconds since the Unix epoch. The
//! content_type column holds the integer mapping documented on
//! [`crate::ContentType`].

use crate::error::Result;
use crate::Store;
use tracing::info;

impl Store {
    /// Ensure all tables exist.
    pub(crate) async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS folder (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                path TEXT NOT NULL UNIQUE,
                time_scanned INTEGER NOT NULL DEFAULT 0
            )"#,
        )
        .execute(self.pool())
        .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS file (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                folder_id INTEGER NOT NULL REFERENCES folder(id) ON DELETE CASCADE,
                path TEXT NOT NULL UNIQUE,
                time_scanned INTEGER NOT NULL DEFAULT 0,
                mtime INTEGER NOT NULL DEFAULT 0,
                content_type INTEGER NOT NULL DEFAULT 5,
                mime_type TEXT NOT NULL DEFAULT '',
                meta TEXT NOT NULL DEFAULT '{}' CHECK (json_valid(meta)),
                content TEXT NOT NULL DEFAULT ''
            )"#,
        )
        .execute(self.pool())
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_file_folder ON file(folder_id)")
            .execute(self.pool())
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_file_scan_time ON file(time_scanned)")
            .execute(self.pool())
            .await?;

        info!("Store schema verified");
        Ok(())
    }
}
