//! On-disk batches of articles.
//!
//! Each save writes one pretty-printed JSON array to `news_<timestamp>.json`
//! in the store directory.  Timestamps are UTC, so file names sort in the
//! order the batches were written.  Writes go to a `.tmp` sibling first and
//! are renamed into place, so a crash mid-save never leaves a torn batch
//! behind.  A batch that fails to decode is renamed to
//! `<name>.corrupted_<timestamp>` and skipped; it is never deleted.
//!
//! The same directory holds `read_items.json`, the set of links the user has
//! read (see [`ReadState`]).
//!
//! Nothing here returns an error to the refresh path.  A failed save or load
//! is logged and reported as "nothing saved" / "nothing loaded".

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::article::Article;
use crate::error::StoreError;

const BATCH_PREFIX: &str = "news_";
const BATCH_EXT: &str = "json";
const CORRUPTED_MARKER: &str = ".corrupted_";
const READ_STATE_FILE: &str = "read_items.json";

#[derive(Debug, Clone)]
pub struct ArticleStore {
    dir: PathBuf,
}

impl ArticleStore {
    /// Use `dir` for batches, creating it if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `articles` as a new batch, or to `filename` if given.
    ///
    /// Returns the path written, or `None` if there was nothing to save or
    /// the write failed.
    pub fn save(&self, articles: &[Article], filename: Option<&str>) -> Option<PathBuf> {
        if articles.is_empty() {
            tracing::warn!("No data to save");
            return None;
        }

        let name = match filename {
            Some(name) => sanitize(name)?,
            None => self.fresh_batch_name(Utc::now()),
        };
        let path = self.dir.join(name);

        match write_atomic(&path, articles) {
            Ok(()) => {
                tracing::info!(path = %path.display(), count = articles.len(), "Saved article batch");
                Some(path)
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Failed to save article batch");
                None
            }
        }
    }

    /// Load a batch.
    ///
    /// With a `filename`, only that batch is tried.  Without one, batches are
    /// tried newest first until one decodes.  Undecodable batches are
    /// quarantined on the way; if nothing loads the result is empty.
    pub fn load(&self, filename: Option<&str>) -> Vec<Article> {
        match filename {
            Some(name) => {
                let Some(name) = sanitize(name) else {
                    return Vec::new();
                };
                let path = self.dir.join(name);
                if !path.exists() {
                    tracing::warn!(path = %path.display(), "Batch file not found");
                    return Vec::new();
                }
                self.try_load(&path).unwrap_or_default()
            }
            None => {
                let batches = self.list_batches();
                if batches.is_empty() {
                    tracing::info!(dir = %self.dir.display(), "No saved batches");
                }
                batches
                    .iter()
                    .rev()
                    .find_map(|name| self.try_load(&self.dir.join(name)))
                    .unwrap_or_default()
            }
        }
    }

    /// `news_<UTC timestamp>.json`, with a counter appended if a batch of
    /// that name already exists.
    fn fresh_batch_name(&self, now: DateTime<Utc>) -> String {
        let stem = format!("{BATCH_PREFIX}{}", now.format("%Y%m%d_%H%M%S_%3f"));
        let mut name = format!("{stem}.{BATCH_EXT}");
        let mut n = 1;
        while self.dir.join(&name).exists() {
            name = format!("{stem}_{n}.{BATCH_EXT}");
            n += 1;
        }
        name
    }

    fn try_load(&self, path: &Path) -> Option<Vec<Article>> {
        match read_json::<Vec<Article>>(path) {
            Ok(articles) => {
                tracing::info!(path = %path.display(), count = articles.len(), "Loaded article batch");
                Some(articles)
            }
            Err(StoreError::Json(e)) => {
                tracing::error!(path = %path.display(), error = %e, "Batch is corrupted");
                self.quarantine(path);
                None
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Failed to read batch");
                None
            }
        }
    }

    /// Batch file names, oldest first.  Quarantined, temporary and
    /// non-batch files are not listed.
    pub fn list_batches(&self) -> Vec<String> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!(dir = %self.dir.display(), error = %e, "Cannot list batches");
                return Vec::new();
            }
        };

        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| is_batch_name(name))
            .collect();
        names.sort();
        names
    }

    /// Delete all but the newest `keep` batches.  Returns how many went.
    pub fn prune(&self, keep: usize) -> usize {
        let batches = self.list_batches();
        let excess = batches.len().saturating_sub(keep);
        let mut removed = 0;
        for name in &batches[..excess] {
            let path = self.dir.join(name);
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to prune batch"),
            }
        }
        if removed > 0 {
            tracing::info!(removed, kept = batches.len() - removed, "Pruned old batches");
        }
        removed
    }

    fn quarantine(&self, path: &Path) {
        let mut target = path.as_os_str().to_owned();
        target.push(format!("{CORRUPTED_MARKER}{}", Utc::now().format("%Y%m%d%H%M%S")));
        let target = PathBuf::from(target);
        match fs::rename(path, &target) {
            Ok(()) => tracing::warn!(to = %target.display(), "Quarantined corrupted batch"),
            Err(e) => tracing::error!(path = %path.display(), error = %e, "Failed to quarantine batch"),
        }
    }
}

fn is_batch_name(name: &str) -> bool {
    name.starts_with(BATCH_PREFIX)
        && Path::new(name).extension().is_some_and(|ext| ext == BATCH_EXT)
        && !name.contains(CORRUPTED_MARKER)
}

/// Reduce a caller-supplied name to a bare file name inside the store.
fn sanitize(name: &str) -> Option<String> {
    let file_name = Path::new(name).file_name().and_then(|n| n.to_str());
    if file_name.is_none() {
        tracing::warn!(name, "Invalid batch file name");
    }
    file_name.map(String::from)
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

/// Serialize `value` to `path` via a synced `.tmp` sibling and a rename.
pub(crate) fn write_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    let tmp = tmp_path(path);
    let result = (|| -> Result<(), StoreError> {
        let mut writer = BufWriter::new(File::create(&tmp)?);
        serde_json::to_writer_pretty(&mut writer, value)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
        drop(writer);
        fs::rename(&tmp, path)?;
        Ok(())
    })();

    if result.is_err() && tmp.exists() {
        if let Err(e) = fs::remove_file(&tmp) {
            tracing::warn!(path = %tmp.display(), error = %e, "Failed to remove temporary file");
        }
    }
    result
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

// ---------------------------------------------------------------------------
// Read state
// ---------------------------------------------------------------------------

/// Links the user has read, saved to `read_items.json` after every change.
///
/// A missing or unreadable file starts out empty.  Failed writes are logged;
/// the in-memory set stays authoritative for the rest of the session.
#[derive(Debug)]
pub struct ReadState {
    path: PathBuf,
    links: RwLock<BTreeSet<String>>,
}

impl ReadState {
    /// Load the read set kept in `dir`.
    pub fn open(dir: &Path) -> Self {
        let path = dir.join(READ_STATE_FILE);
        let links = if path.exists() {
            match read_json::<BTreeSet<String>>(&path) {
                Ok(links) => {
                    tracing::debug!(count = links.len(), "Loaded read state");
                    links
                }
                Err(e) => {
                    tracing::error!(path = %path.display(), error = %e, "Failed to read read state");
                    BTreeSet::new()
                }
            }
        } else {
            BTreeSet::new()
        };
        Self {
            path,
            links: RwLock::new(links),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeSet<String>> {
        self.links.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_read(&self, link: &str) -> bool {
        let link = link.trim();
        !link.is_empty()
            && self
                .links
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .contains(link)
    }

    /// Returns `true` if the link was not already marked.
    pub fn mark_read(&self, link: &str) -> bool {
        let link = link.trim();
        if link.is_empty() {
            tracing::warn!("Ignoring mark-as-read for an empty link");
            return false;
        }
        let mut links = self.write();
        if !links.insert(link.to_string()) {
            return false;
        }
        tracing::info!(link, "Marked as read");
        self.persist(&links);
        true
    }

    /// Returns `true` if the link had been marked read.
    pub fn mark_unread(&self, link: &str) -> bool {
        let mut links = self.write();
        if !links.remove(link.trim()) {
            tracing::debug!(link, "Link was not marked as read");
            return false;
        }
        tracing::info!(link, "Marked as unread");
        self.persist(&links);
        true
    }

    /// Forget every read mark.  Returns how many there were.
    pub fn clear(&self) -> usize {
        let mut links = self.write();
        let cleared = links.len();
        if cleared > 0 {
            links.clear();
            tracing::info!(cleared, "Cleared read state");
            self.persist(&links);
        }
        cleared
    }

    pub fn len(&self) -> usize {
        self.links.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Called with the write lock held so saves land in mutation order.
    fn persist(&self, links: &BTreeSet<String>) {
        if let Err(e) = write_atomic(&self.path, links) {
            tracing::error!(path = %self.path.display(), error = %e, "Failed to save read state");
        }
    }
}
