//! Pythia: an incremental file indexer.
//!
//! Walks configured directory trees, filters paths through a
//! self-tuning blacklist, classifies surviving files by suffix, runs
//! type-specific extractors and persists the results through
//! [`pythia_db`].

pub mod blacklist;
pub mod config;
pub mod crawler;
pub mod error;
pub mod extractor;
pub mod inspector;

pub use blacklist::Blacklist;
pub use config::CrawlConfig;
pub use crawler::{CrawlReport, CrawlStats, Crawler};
pub use error::{CrawlError, Result};
pub use inspector::Inspector;
