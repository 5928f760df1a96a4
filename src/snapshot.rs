//! Full-tree snapshots.
//!
//! A [`Snapshot`] maps every regular file under a root to the digest of its
//! content. [`build_snapshot`] walks the whole tree before returning, so the
//! result can be treated as a consistent picture of the tree for diffing.
//! Hashing is spread over a small pool of scoped worker threads; since every
//! enumerated path is handed to exactly one worker and results are merged
//! only after all workers finish, the outcome is the same as a sequential
//! pass.

use crate::fingerprint::{Digest, fingerprint};
use crate::util::paths::relative_key;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::btree_map;
use std::io::ErrorKind;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("Directory {0} does not exist")]
    RootNotFound(PathBuf),
    #[error("{0} is not a directory")]
    NotADirectory(PathBuf),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("IO error: {0}")]
    Io(std::io::Error),
}

/// Mapping from root-relative path (`/` separated) to content digest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    entries: BTreeMap<String, Digest>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<&Digest> {
        self.entries.get(path)
    }

    #[allow(dead_code)]
    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// Inserts or replaces, returning the previous digest.
    pub fn insert(&mut self, path: String, digest: Digest) -> Option<Digest> {
        self.entries.insert(path, digest)
    }

    pub fn remove(&mut self, path: &str) -> Option<Digest> {
        self.entries.remove(path)
    }

    /// Entries in path order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, Digest> {
        self.entries.iter()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl FromIterator<(String, Digest)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (String, Digest)>>(iter: I) -> Self {
        Snapshot {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = (&'a String, &'a Digest);
    type IntoIter = btree_map::Iter<'a, String, Digest>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    /// Number of hashing threads.
    pub jobs: NonZeroUsize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        ScanOptions {
            jobs: std::thread::available_parallelism().unwrap_or(NonZeroUsize::MIN),
        }
    }
}

/// Checks that `root` is an existing directory and returns its canonical form.
pub fn check_root(root: &Path) -> Result<PathBuf, ScanError> {
    let metadata = std::fs::metadata(root).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ScanError::RootNotFound(root.to_path_buf()),
        ErrorKind::PermissionDenied => ScanError::PermissionDenied(root.to_path_buf()),
        _ => ScanError::Io(e),
    })?;

    if !metadata.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }

    root.canonicalize().map_err(ScanError::Io)
}

/// Builds a snapshot of every regular file under `root`.
///
/// Symlinks are not followed and, like directories and special files, do
/// not get entries. Files whose digest cannot be computed, subdirectories
/// that cannot be listed and paths that are not valid UTF-8 are skipped
/// rather than failing the build. An empty tree yields an empty snapshot.
///
/// # Errors
///
/// Only if `root` itself is missing, not a directory or inaccessible.
pub fn build_snapshot(root: &Path, options: &ScanOptions) -> Result<Snapshot, ScanError> {
    let root = check_root(root)?;

    let files = enumerate_files(&root);
    debug!(
        "Found {} files under {}, hashing with {} jobs",
        files.len(),
        root.display(),
        options.jobs
    );

    let snapshot: Snapshot = hash_files(&files, options.jobs.get()).into_iter().collect();

    info!(
        "Snapshot of {} has {} entries ({} skipped)",
        root.display(),
        snapshot.len(),
        files.len() - snapshot.len()
    );

    Ok(snapshot)
}

fn enumerate_files(root: &Path) -> Vec<(String, PathBuf)> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };

        match relative_key(relative) {
            Some(key) => files.push((key, entry.into_path())),
            None => warn!("Skipping path that is not valid UTF-8: {}", entry.path().display()),
        }
    }

    files
}

fn hash_files(files: &[(String, PathBuf)], jobs: usize) -> Vec<(String, Digest)> {
    let jobs = jobs.clamp(1, files.len().max(1));
    let cursor = AtomicUsize::new(0);

    std::thread::scope(|scope| {
        let workers: Vec<_> = (0..jobs)
            .map(|_| {
                scope.spawn(|| {
                    let mut hashed = Vec::new();
                    loop {
                        let index = cursor.fetch_add(1, Ordering::Relaxed);
                        let Some((key, path)) = files.get(index) else {
                            break;
                        };
                        if let Some(digest) = fingerprint(path) {
                            hashed.push((key.clone(), digest));
                        }
                    }
                    hashed
                })
            })
            .collect();

        workers
            .into_iter()
            .flat_map(|worker| match worker.join() {
                Ok(hashed) => hashed,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    })
}
