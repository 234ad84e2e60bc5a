//! Concurrent directory traversal.
//!
//! One worker task per configured root. Workers share the store and
//! the blacklist but never coordinate beyond that: a file path is only
//! ever written by the worker walking its subtree. The liveness flag
//! is advisory; workers poll it between directories and exit cleanly,
//! leaving every already-written record intact.

use crate::blacklist::Blacklist;
use crate::error::{CrawlError, Result};
use crate::inspector::Inspector;
use chrono::{DateTime, Utc};
use pythia_db::{FileRecord, Folder, Store, StoreError};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Per-root traversal counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CrawlStats {
    /// Files observed for the first time.
    pub files_new: u64,
    /// Existing records refreshed because the on-disk file changed.
    pub files_updated: u64,
    /// Existing records left untouched.
    pub files_unchanged: u64,
    /// Files skipped by the blacklist.
    pub files_skipped: u64,
    /// Directories pruned by the blacklist, subtrees never visited.
    pub dirs_pruned: u64,
    /// Per-file failures: unreadable, vanished mid-walk, unparsable.
    pub errors: u64,
    pub duration_ms: u64,
}

/// Outcome of one root's traversal.
#[derive(Debug)]
pub struct CrawlReport {
    pub root: PathBuf,
    pub stats: CrawlStats,
    /// Structural failure of this root, if any. Other roots are
    /// unaffected.
    pub error: Option<CrawlError>,
}

impl CrawlReport {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Walks configured roots, filtering through the blacklist and
/// upserting records via the store.
pub struct Crawler {
    roots: Vec<PathBuf>,
    store: Store,
    blacklist: Arc<Blacklist>,
    inspector: Arc<Inspector>,
    active: Arc<AtomicBool>,
    workers: Mutex<Vec<(PathBuf, JoinHandle<CrawlReport>)>>,
}

impl Crawler {
    pub fn new(
        roots: Vec<PathBuf>,
        store: Store,
        blacklist: Arc<Blacklist>,
        inspector: Arc<Inspector>,
    ) -> Self {
        Self {
            roots,
            store,
            blacklist,
            inspector,
            active: Arc::new(AtomicBool::new(false)),
            workers: Mutex::new(Vec::new()),
        }
    }

    /// Spawn one worker per configured root and return immediately.
    ///
    /// Fails with [`CrawlError::Busy`] while a previous traversal is
    /// still in flight.
    pub fn traverse(&self) -> Result<()> {
        if self.active.swap(true, Ordering::SeqCst) {
            return Err(CrawlError::Busy);
        }

        let mut workers = match self.workers.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        for root in &self.roots {
            let handle = tokio::spawn(crawl_root(
                self.store.clone(),
                Arc::clone(&self.blacklist),
                Arc::clone(&self.inspector),
                Arc::clone(&self.active),
                root.clone(),
            ));
            workers.push((root.clone(), handle));
        }

        info!(roots = self.roots.len(), "Crawl started");
        Ok(())
    }

    /// Request a cooperative stop. In-flight workers exit at their
    /// next directory boundary.
    pub fn stop(&self) {
        self.active.store(false, Ordering::SeqCst);
    }

    /// Point-in-time read of the liveness flag.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Await all in-flight workers and collect their reports.
    ///
    /// Clears the worker registry and the liveness flag; a new
    /// traversal may be started afterwards.
    pub async fn join(&self) -> Vec<CrawlReport> {
        let handles = {
            let mut workers = match self.workers.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            std::mem::take(&mut *workers)
        };

        let mut reports = Vec::with_capacity(handles.len());
        for (root, handle) in handles {
            match handle.await {
                Ok(report) => reports.push(report),
                Err(e) => reports.push(CrawlReport {
                    root,
                    stats: CrawlStats::default(),
                    error: Some(CrawlError::Worker(e.to_string())),
                }),
            }
        }

        self.active.store(false, Ordering::SeqCst);
        reports
    }
}

async fn crawl_root(
    store: Store,
    blacklist: Arc<Blacklist>,
    inspector: Arc<Inspector>,
    active: Arc<AtomicBool>,
    root: PathBuf,
) -> CrawlReport {
    let started = Instant::now();
    let mut stats = CrawlStats::default();

    let result = walk_root(&store, &blacklist, &inspector, &active, &root, &mut stats).await;
    stats.duration_ms = started.elapsed().as_millis() as u64;

    match &result {
        Ok(()) => info!(
            root = %root.display(),
            new = stats.files_new,
            updated = stats.files_updated,
            unchanged = stats.files_unchanged,
            skipped = stats.files_skipped,
            pruned = stats.dirs_pruned,
            errors = stats.errors,
            duration_ms = stats.duration_ms,
            "Crawl finished"
        ),
        Err(e) => warn!(root = %root.display(), error = %e, "Crawl failed"),
    }

    CrawlReport {
        root,
        stats,
        error: result.err(),
    }
}

async fn walk_root(
    store: &Store,
    blacklist: &Blacklist,
    inspector: &Inspector,
    active: &AtomicBool,
    root: &Path,
    stats: &mut CrawlStats,
) -> Result<()> {
    let metadata = tokio::fs::metadata(root)
        .await
        .map_err(|e| root_stat_error(root, e))?;
    if !metadata.is_dir() {
        return Err(CrawlError::NotADirectory(root.to_path_buf()));
    }

    let root_str = root.to_string_lossy().into_owned();
    let folder = folder_get_or_create(store, &root_str).await?;

    let mut queue = VecDeque::from([root.to_path_buf()]);
    let mut stopped = false;

    while let Some(dir) = queue.pop_front() {
        if !active.load(Ordering::SeqCst) {
            debug!(root = %root.display(), "Stop requested, exiting at directory boundary");
            stopped = true;
            break;
        }

        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Cannot list directory");
                stats.errors += 1;
                continue;
            }
        };

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    warn!(dir = %dir.display(), error = %e, "Directory listing failed");
                    stats.errors += 1;
                    break;
                }
            };

            let name = entry.file_name().to_string_lossy().into_owned();
            let file_type = match entry.file_type().await {
                Ok(file_type) => file_type,
                Err(e) => {
                    warn!(path = %entry.path().display(), error = %e, "Cannot stat entry");
                    stats.errors += 1;
                    continue;
                }
            };

            if file_type.is_dir() {
                // Blacklisted subtrees are pruned before descent, never visited.
                if blacklist.matches(&name) {
                    stats.dirs_pruned += 1;
                } else {
                    queue.push_back(entry.path());
                }
                continue;
            }

            if file_type.is_symlink() {
                // Follow file symlinks through metadata; never descend
                // through directory symlinks (cycle safety).
                match tokio::fs::metadata(entry.path()).await {
                    Ok(target) if target.is_dir() => continue,
                    Ok(_) => {}
                    Err(e) => {
                        debug!(path = %entry.path().display(), error = %e, "Dangling symlink");
                        stats.errors += 1;
                        continue;
                    }
                }
            }

            if blacklist.matches(&name) {
                stats.files_skipped += 1;
                continue;
            }

            if let Err(e) = process_file(store, inspector, folder.id, entry.path(), stats).await {
                warn!(path = %entry.path().display(), error = %e, "Failed to index file");
                stats.errors += 1;
            }
        }
    }

    // Only a completed traversal counts as a scan of the root.
    if !stopped {
        store.folder_update_scan(folder.id, Utc::now()).await?;
    }

    Ok(())
}

/// A missing root is a distinct structural failure; any other stat
/// error (permissions, IO) keeps its cause.
fn root_stat_error(root: &Path, e: std::io::Error) -> CrawlError {
    if e.kind() == std::io::ErrorKind::NotFound {
        CrawlError::RootNotFound(root.to_path_buf())
    } else {
        CrawlError::Io(e)
    }
}

/// Lookup by path, insert when absent; a duplicate insert means
/// another worker won a race, so re-read its row.
async fn folder_get_or_create(store: &Store, path: &str) -> Result<Folder> {
    if let Some(folder) = store.folder_get_by_path(path).await? {
        return Ok(folder);
    }

    let mut folder = Folder::new(path);
    match store.folder_add(&mut folder).await {
        Ok(()) => Ok(folder),
        Err(StoreError::Duplicate(_)) => store
            .folder_get_by_path(path)
            .await?
            .ok_or_else(|| CrawlError::Worker(format!("Folder vanished after insert race: {path}"))),
        Err(e) => Err(e.into()),
    }
}

async fn process_file(
    store: &Store,
    inspector: &Inspector,
    folder_id: i64,
    path: PathBuf,
    stats: &mut CrawlStats,
) -> Result<()> {
    let metadata = tokio::fs::metadata(&path).await?;
    let mtime: DateTime<Utc> = metadata.modified()?.into();
    let path_str = path.to_string_lossy().into_owned();

    match store.file_get_by_path(&path_str).await? {
        Some(mut record) => {
            if record.needs_update(mtime) {
                record.time_scanned = Utc::now();
                record.mtime = mtime;
                if !inspector.inspect(&mut record).await {
                    stats.errors += 1;
                }
                store.file_update(&record).await?;
                stats.files_updated += 1;
            } else {
                stats.files_unchanged += 1;
            }
        }
        None => {
            let mut record = FileRecord::new(folder_id, path_str.clone(), mtime);
            if !inspector.inspect(&mut record).await {
                stats.errors += 1;
            }
            match store.file_add(&mut record).await {
                Ok(()) => stats.files_new += 1,
                Err(StoreError::Duplicate(_)) => {
                    // Insert race: fall back to the update path.
                    if let Some(existing) = store.file_get_by_path(&path_str).await? {
                        record.id = existing.id;
                        store.file_update(&record).await?;
                        stats.files_updated += 1;
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    Ok(())
}
