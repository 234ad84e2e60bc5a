//! CRUD operations for folder and file records.

use crate::error::{Result, StoreError};
use crate::types::{ContentType, FileRecord, Folder};
use crate::Store;
use chrono::{DateTime, Utc};
use sqlx::Row;

impl Store {
    // ========================================================================
    // Folder Operations
    // ========================================================================

    /// Insert a new folder; assigns `folder.id`.
    ///
    /// Returns [`StoreError::Duplicate`] when the path is already
    /// present; the existing row is left untouched.
    pub async fn folder_add(&self, folder: &mut Folder) -> Result<()> {
        let result = sqlx::query("INSERT INTO folder (path, time_scanned) VALUES (?, ?)")
            .bind(&folder.path)
            .bind(Self::to_millis(folder.time_scanned))
            .execute(self.pool())
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                    StoreError::Duplicate(folder.path.clone())
                }
                _ => StoreError::Sqlx(e),
            })?;

        folder.id = result.last_insert_rowid();
        Ok(())
    }

    /// Get a folder by path.
    pub async fn folder_get_by_path(&self, path: &str) -> Result<Option<Folder>> {
        let row = sqlx::query("SELECT id, path, time_scanned FROM folder WHERE path = ?")
            .bind(path)
            .fetch_optional(self.pool())
            .await?;

        match row {
            Some(row) => Ok(Some(Self::row_to_folder(&row)?)),
            None => Ok(None),
        }
    }

    /// List all folders, ordered by path.
    pub async fn folder_get_all(&self) -> Result<Vec<Folder>> {
        let rows = sqlx::query("SELECT id, path, time_scanned FROM folder ORDER BY path")
            .fetch_all(self.pool())
            .await?;

        rows.iter().map(Self::row_to_folder).collect()
    }

    /// Record the completion time of a full traversal.
    pub async fn folder_update_scan(&self, folder_id: i64, timestamp: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE folder SET time_scanned = ? WHERE id = ?")
            .bind(Self::to_millis(timestamp))
            .bind(folder_id)
            .execute(self.pool())
            .await?;

        Ok(())
    }

    /// Delete a folder; its files are removed by the cascade rule.
    pub async fn folder_delete(&self, folder_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM folder WHERE id = ?")
            .bind(folder_id)
            .execute(self.pool())
            .await?;

        Ok(())
    }

    // ========================================================================
    // File Operations
    // ========================================================================

    /// Insert a new file record; assigns `file.id`.
    ///
    /// Returns [`StoreError::Duplicate`] when the path is already
    /// present and [`StoreError::MissingFolder`] when `folder_id` does
    /// not reference an existing folder.
    pub async fn file_add(&self, file: &mut FileRecord) -> Result<()> {
        let meta_json = serde_json::to_string(&file.meta)?;

        let result = sqlx::query(
            r#"
            INSERT INTO file (folder_id, path, time_scanned, mtime, content_type, mime_type, meta, content)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(file.folder_id)
        .bind(&file.path)
        .bind(Self::to_millis(file.time_scanned))
        .bind(Self::to_millis(file.mtime))
        .bind(file.content_type.as_i64())
        .bind(&file.mime_type)
        .bind(&meta_json)
        .bind(&file.content)
        .execute(self.pool())
        .await
        .map_err(|e| StoreError::from_insert(e, &file.path, file.folder_id))?;

        file.id = result.last_insert_rowid();
        Ok(())
    }

    /// Get a file record by path.
    pub async fn file_get_by_path(&self, path: &str) -> Result<Option<FileRecord>> {
        let row = sqlx::query(
            "SELECT id, folder_id, path, time_scanned, mtime, content_type, mime_type, meta, content FROM file WHERE path = ?",
        )
        .bind(path)
        .fetch_optional(self.pool())
        .await?;

        match row {
            Some(row) => Ok(Some(Self::row_to_file(&row)?)),
            None => Ok(None),
        }
    }

    /// Get a file record by id.
    pub async fn file_get_by_id(&self, id: i64) -> Result<Option<FileRecord>> {
        let row = sqlx::query(
            "SELECT id, folder_id, path, time_scanned, mtime, content_type, mime_type, meta, content FROM file WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        match row {
            Some(row) => Ok(Some(Self::row_to_file(&row)?)),
            None => Ok(None),
        }
    }

    /// List a folder's files, ordered by path.
    pub async fn file_get_by_folder(&self, folder_id: i64) -> Result<Vec<FileRecord>> {
        let rows = sqlx::query(
            "SELECT id, folder_id, path, time_scanned, mtime, content_type, mime_type, meta, content FROM file WHERE folder_id = ? ORDER BY path",
        )
        .bind(folder_id)
        .fetch_all(self.pool())
        .await?;

        rows.iter().map(Self::row_to_file).collect()
    }

    /// Rewrite a file record in place, keyed by id.
    pub async fn file_update(&self, file: &FileRecord) -> Result<()> {
        let meta_json = serde_json::to_string(&file.meta)?;

        sqlx::query(
            r#"
            UPDATE file SET
                folder_id = ?,
                path = ?,
                time_scanned = ?,
                mtime = ?,
                content_type = ?,
                mime_type = ?,
                meta = ?,
                content = ?
            WHERE id = ?
            "#,
        )
        .bind(file.folder_id)
        .bind(&file.path)
        .bind(Self::to_millis(file.time_scanned))
        .bind(Self::to_millis(file.mtime))
        .bind(file.content_type.as_i64())
        .bind(&file.mime_type)
        .bind(&meta_json)
        .bind(&file.content)
        .bind(file.id)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Delete a file record by id.
    pub async fn file_delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM file WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;

        Ok(())
    }

    // ========================================================================
    // Row Decoding
    // ========================================================================

    fn row_to_folder(row: &sqlx::sqlite::SqliteRow) -> Result<Folder> {
        Ok(Folder {
            id: row.get("id"),
            path: row.get("path"),
            time_scanned: Self::from_millis(row.get("time_scanned"))?,
        })
    }

    fn row_to_file(row: &sqlx::sqlite::SqliteRow) -> Result<FileRecord> {
        let content_type_raw: i64 = row.get("content_type");
        let content_type = ContentType::from_i64(content_type_raw).ok_or_else(|| {
            StoreError::Corrupt(format!("Unknown content type: {content_type_raw}"))
        })?;

        let meta_json: String = row.get("meta");
        let meta = serde_json::from_str(&meta_json)?;

        Ok(FileRecord {
            id: row.get("id"),
            folder_id: row.get("folder_id"),
            path: row.get("path"),
            time_scanned: Self::from_millis(row.get("time_scanned"))?,
            mtime: Self::from_millis(row.get("mtime"))?,
            content_type,
            mime_type: row.get("mime_type"),
            meta,
            content: row.get("content"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn test_store() -> (tempfile::TempDir, Store) {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("test.sqlite3")).await.unwrap();
        (dir, store)
    }

    fn test_file(folder_id: i64, path: &str) -> FileRecord {
        FileRecord::new(folder_id, path, Utc::now())
    }

    #[tokio::test]
    async fn test_folder_add_and_get() {
        let (_dir, store) = test_store().await;

        let mut folder = Folder::new("/data/books");
        store.folder_add(&mut folder).await.unwrap();
        assert!(folder.id > 0);

        let fetched = store.folder_get_by_path("/data/books").await.unwrap();
        assert_eq!(fetched, Some(folder));

        assert!(store.folder_get_by_path("/nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_folder_duplicate_path_rejected() {
        let (_dir, store) = test_store().await;

        let mut first = Folder::new("/data");
        store.folder_add(&mut first).await.unwrap();

        let mut second = Folder::new("/data");
        let err = store.folder_add(&mut second).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(ref p) if p == "/data"));

        // first record intact
        let fetched = store.folder_get_by_path("/data").await.unwrap().unwrap();
        assert_eq!(fetched.id, first.id);
    }

    #[tokio::test]
    async fn test_folder_get_all_ordered_by_path() {
        let (_dir, store) = test_store().await;

        for path in ["/zeta", "/alpha", "/mid"] {
            store.folder_add(&mut Folder::new(path)).await.unwrap();
        }

        let all = store.folder_get_all().await.unwrap();
        let paths: Vec<_> = all.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["/alpha", "/mid", "/zeta"]);
    }

    #[tokio::test]
    async fn test_folder_update_scan() {
        let (_dir, store) = test_store().await;

        let mut folder = Folder::new("/data");
        store.folder_add(&mut folder).await.unwrap();
        assert_eq!(folder.time_scanned, DateTime::<Utc>::UNIX_EPOCH);

        let now = Utc::now();
        store.folder_update_scan(folder.id, now).await.unwrap();

        let fetched = store.folder_get_by_path("/data").await.unwrap().unwrap();
        assert_eq!(fetched.time_scanned.timestamp_millis(), now.timestamp_millis());
    }

    #[tokio::test]
    async fn test_file_add_roundtrip() {
        let (_dir, store) = test_store().await;

        let mut folder = Folder::new("/data");
        store.folder_add(&mut folder).await.unwrap();

        let mut file = test_file(folder.id, "/data/a.pdf");
        file.content_type = ContentType::Pdf;
        file.meta
            .insert("title".into(), serde_json::Value::String("A".into()));
        file.content = "hello".into();
        store.file_add(&mut file).await.unwrap();
        assert!(file.id > 0);

        let by_path = store.file_get_by_path("/data/a.pdf").await.unwrap().unwrap();
        let by_id = store.file_get_by_id(file.id).await.unwrap().unwrap();
        assert_eq!(by_path.content_type, ContentType::Pdf);
        assert_eq!(by_path.meta["title"], "A");
        assert_eq!(by_path.content, "hello");
        assert_eq!(by_path.mime_type, "application/pdf");
        assert_eq!(by_path, by_id);
    }

    #[tokio::test]
    async fn test_file_duplicate_path_rejected() {
        let (_dir, store) = test_store().await;

        let mut folder = Folder::new("/data");
        store.folder_add(&mut folder).await.unwrap();

        let mut first = test_file(folder.id, "/data/a.txt");
        first.content = "original".into();
        store.file_add(&mut first).await.unwrap();

        let mut second = test_file(folder.id, "/data/a.txt");
        let err = store.file_add(&mut second).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));

        let fetched = store.file_get_by_path("/data/a.txt").await.unwrap().unwrap();
        assert_eq!(fetched.id, first.id);
        assert_eq!(fetched.content, "original");
    }

    #[tokio::test]
    async fn test_file_add_unknown_folder_rejected() {
        let (_dir, store) = test_store().await;

        let mut file = test_file(9999, "/data/a.txt");
        let err = store.file_add(&mut file).await.unwrap_err();
        assert!(matches!(err, StoreError::MissingFolder(9999)));
    }

    #[tokio::test]
    async fn test_file_get_by_folder_ordered_by_path() {
        let (_dir, store) = test_store().await;

        let mut folder = Folder::new("/data");
        store.folder_add(&mut folder).await.unwrap();
        let mut other = Folder::new("/other");
        store.folder_add(&mut other).await.unwrap();

        for path in ["/data/c.txt", "/data/a.txt", "/data/b.txt"] {
            store.file_add(&mut test_file(folder.id, path)).await.unwrap();
        }
        store
            .file_add(&mut test_file(other.id, "/other/x.txt"))
            .await
            .unwrap();

        let files = store.file_get_by_folder(folder.id).await.unwrap();
        let paths: Vec<_> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["/data/a.txt", "/data/b.txt", "/data/c.txt"]);
    }

    #[tokio::test]
    async fn test_file_update() {
        let (_dir, store) = test_store().await;

        let mut folder = Folder::new("/data");
        store.folder_add(&mut folder).await.unwrap();

        let mut file = test_file(folder.id, "/data/a.txt");
        store.file_add(&mut file).await.unwrap();

        file.content_type = ContentType::Text;
        file.content = "updated".into();
        file.meta
            .insert("k".into(), serde_json::Value::String("v".into()));
        store.file_update(&file).await.unwrap();

        let fetched = store.file_get_by_id(file.id).await.unwrap().unwrap();
        assert_eq!(fetched.content_type, ContentType::Text);
        assert_eq!(fetched.content, "updated");
        assert_eq!(fetched.meta["k"], "v");
    }

    #[tokio::test]
    async fn test_file_delete() {
        let (_dir, store) = test_store().await;

        let mut folder = Folder::new("/data");
        store.folder_add(&mut folder).await.unwrap();
        let mut file = test_file(folder.id, "/data/a.txt");
        store.file_add(&mut file).await.unwrap();

        store.file_delete(file.id).await.unwrap();
        assert!(store.file_get_by_id(file.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_folder_delete_cascades_to_files() {
        let (_dir, store) = test_store().await;

        let mut folder = Folder::new("/data");
        store.folder_add(&mut folder).await.unwrap();
        let mut keep = Folder::new("/keep");
        store.folder_add(&mut keep).await.unwrap();

        store
            .file_add(&mut test_file(folder.id, "/data/a.txt"))
            .await
            .unwrap();
        store
            .file_add(&mut test_file(folder.id, "/data/b.txt"))
            .await
            .unwrap();
        let mut kept = test_file(keep.id, "/keep/c.txt");
        store.file_add(&mut kept).await.unwrap();

        store.folder_delete(folder.id).await.unwrap();

        assert!(store.file_get_by_path("/data/a.txt").await.unwrap().is_none());
        assert!(store.file_get_by_path("/data/b.txt").await.unwrap().is_none());
        assert!(store.file_get_by_id(kept.id).await.unwrap().is_some());
    }
}
