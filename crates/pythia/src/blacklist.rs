//! Self-tuning path blacklist.
//!
//! Patterns are regular expressions matched search-anywhere against a
//! candidate string (a file or directory name, or a full path). Every
//! hit bumps the matching pattern's counter and re-sorts the list by
//! descending hits, so common rejects migrate to the front and the
//! average number of comparisons stays low. Counters are never
//! persisted; they reset each run.

use crate::error::{CrawlError, Result};
use regex::Regex;
use std::sync::Mutex;

/// Patterns applied when none are configured: VCS metadata, editor
/// backup/autosave files and cache directories.
pub const DEFAULT_PATTERNS: &[&str] = &[
    r"^[.]git$",
    r"^[.]hg$",
    r"^[.]svn$",
    r"~$",
    r"^#.*#$",
    r"[.]bak$",
    r"^__pycache__$",
    r"[.]cache$",
];

#[derive(Debug)]
struct BlacklistItem {
    pattern: Regex,
    hits: u64,
}

/// Ordered rule set shared by all crawl workers.
#[derive(Debug)]
pub struct Blacklist {
    items: Mutex<Vec<BlacklistItem>>,
}

impl Blacklist {
    /// Compile a pattern list. Fails on the first invalid pattern.
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut items = Vec::new();
        for pattern in patterns {
            let pattern = pattern.as_ref();
            let compiled = Regex::new(pattern).map_err(|e| CrawlError::Pattern {
                pattern: pattern.to_string(),
                message: e.to_string(),
            })?;
            items.push(BlacklistItem {
                pattern: compiled,
                hits: 0,
            });
        }
        Ok(Self {
            items: Mutex::new(items),
        })
    }

    /// Compile the built-in default pattern set.
    pub fn with_defaults() -> Result<Self> {
        Self::new(DEFAULT_PATTERNS)
    }

    /// Test `candidate` against the rules in current order.
    ///
    /// On the first hit the matching rule's counter is incremented and
    /// the list re-sorted by descending hits; the scan, bump and
    /// reorder happen under one lock acquisition, so concurrent
    /// callers never observe a partial reordering.
    pub fn matches(&self, candidate: &str) -> bool {
        let mut items = match self.items.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        for idx in 0..items.len() {
            if items[idx].pattern.is_match(candidate) {
                items[idx].hits += 1;
                items.sort_by(|a, b| b.hits.cmp(&a.hits));
                return true;
            }
        }
        false
    }

    /// Snapshot of (pattern, hits) in current order.
    pub fn hit_counts(&self) -> Vec<(String, u64)> {
        let items = match self.items.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        items
            .iter()
            .map(|item| (item.pattern.as_str().to_string(), item.hits))
            .collect()
    }
}
