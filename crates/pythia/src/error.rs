//! Error types for the crawl pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Crawl operation result type.
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Crawl errors.
#[derive(Error, Debug)]
pub enum CrawlError {
    /// IO error (enumeration, stat)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Store error
    #[error("Store error: {0}")]
    Store(#[from] pythia_db::StoreError),

    /// Invalid blacklist pattern
    #[error("Invalid blacklist pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Root path does not exist
    #[error("Root path not found: {0}")]
    RootNotFound(PathBuf),

    /// Root path is not a directory
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// A traversal is already in flight
    #[error("A crawl is already running")]
    Busy,

    /// A worker task failed outside the normal error paths
    #[error("Worker failed: {0}")]
    Worker(String),
}
