//! Error types for the store layer.

use thiserror::Error;

/// Store operation result type.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLx error (connection, query, etc.)
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// IO error (file system operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unique-path violation on insert
    #[error("Record already exists for path: {0}")]
    Duplicate(String),

    /// Foreign-key violation: the referenced folder does not exist
    #[error("No folder with id {0}")]
    MissingFolder(i64),

    /// A persisted value could not be decoded
    #[error("Corrupt record: {0}")]
    Corrupt(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Map a constraint failure on a path-keyed insert to a typed error.
    ///
    /// Unique violations become [`StoreError::Duplicate`] so callers can
    /// fall back to an update; foreign-key violations become
    /// [`StoreError::MissingFolder`].
    pub(crate) fn from_insert(err: sqlx::Error, path: &str, folder_id: i64) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return StoreError::Duplicate(path.to_string());
            }
            if db_err.is_foreign_key_violation() {
                return StoreError::MissingFolder(folder_id);
            }
        }
        StoreError::Sqlx(err)
    }
}
