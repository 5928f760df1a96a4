//! Live reconciliation of a baseline against filesystem notifications.
//!
//! The [`Reconciler`] owns a working copy of the baseline and the list of
//! events recorded during a session. Each [`Notification`] is applied as one
//! complete transition:
//!
//! * `Created`: if the file has a digest, track it and record `ADDED`.
//! * `Modified`: if the file has a digest that differs from the tracked one
//!   (or the path is untracked), track it and record `MODIFIED`. Re-saves of
//!   identical content record nothing.
//! * `Deleted`: if the path was tracked, untrack it and record `DELETED`.
//! * `Renamed`: a `Deleted` of the source followed by a `Created` of the
//!   destination, each resolved on its own. A rename onto the same path is a
//!   `Modified` of that path.
//!
//! Paths that do not resolve under the root are dropped, as are symlinks and
//! paths reached through one. A digest that cannot be computed is treated
//! like a file that is not there.

use crate::event::Event;
use crate::fingerprint::Digest;
use crate::snapshot::Snapshot;
use crate::util::paths::resolve_under_root;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Where the reconciler gets content digests from. On a real tree this is
/// [`crate::fingerprint::fingerprint`].
pub trait DigestSource {
    fn digest(&self, path: &Path) -> Option<Digest>;
}

impl<F> DigestSource for F
where
    F: Fn(&Path) -> Option<Digest>,
{
    fn digest(&self, path: &Path) -> Option<Digest> {
        self(path)
    }
}

/// A filesystem change, with absolute paths, as seen by the reconciler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Created(PathBuf),
    Modified(PathBuf),
    Deleted(PathBuf),
    Renamed { from: PathBuf, to: PathBuf },
}

/// What a finished session hands back to its caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutcome {
    pub baseline: Snapshot,
    /// In the order the changes were observed.
    pub events: Vec<Event>,
}

pub struct Reconciler<S> {
    root: PathBuf,
    source: S,
    baseline: Snapshot,
    events: Vec<Event>,
}

impl<S: DigestSource> Reconciler<S> {
    /// `root` should be canonical; notifications are resolved against it.
    pub fn new(root: PathBuf, baseline: Snapshot, source: S) -> Self {
        Reconciler {
            root,
            source,
            baseline,
            events: Vec::new(),
        }
    }

    pub fn baseline(&self) -> &Snapshot {
        &self.baseline
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Applies one notification, returning how many events it produced.
    pub fn apply(&mut self, notification: Notification) -> usize {
        let before = self.events.len();

        match notification {
            Notification::Created(path) => self.created(&path),
            Notification::Modified(path) => self.modified(&path),
            Notification::Deleted(path) => self.deleted(&path),
            Notification::Renamed { from, to } => self.renamed(&from, &to),
        }

        self.events.len() - before
    }

    pub fn finish(self) -> SessionOutcome {
        SessionOutcome {
            baseline: self.baseline,
            events: self.events,
        }
    }

    fn resolve(&self, path: &Path) -> Option<String> {
        let key = resolve_under_root(&self.root, path);
        if key.is_none() {
            debug!("Ignoring change outside {}: {}", self.root.display(), path.display());
        }
        key
    }

    fn created(&mut self, path: &Path) {
        let Some(key) = self.resolve(path) else {
            return;
        };
        let Some(digest) = self.source.digest(path) else {
            debug!("Ignoring creation of {} (no digest)", key);
            return;
        };

        self.baseline.insert(key.clone(), digest.clone());
        self.record(Event::added(key, digest));
    }

    fn modified(&mut self, path: &Path) {
        let Some(key) = self.resolve(path) else {
            return;
        };
        self.modified_key(key, path);
    }

    fn modified_key(&mut self, key: String, path: &Path) {
        let Some(digest) = self.source.digest(path) else {
            debug!("Ignoring modification of {} (no digest)", key);
            return;
        };

        let previous = self.baseline.get(&key).cloned();
        match Event::modified(key.clone(), previous, digest.clone()) {
            Some(event) => {
                self.baseline.insert(key, digest);
                self.record(event);
            }
            None => debug!("Content of {} unchanged", key),
        }
    }

    fn deleted(&mut self, path: &Path) {
        let Some(key) = self.resolve(path) else {
            return;
        };
        self.deleted_key(&key);
    }

    fn deleted_key(&mut self, key: &str) {
        if let Some(old_digest) = self.baseline.remove(key) {
            self.record(Event::deleted(key.to_string(), old_digest));
        }
    }

    fn renamed(&mut self, from: &Path, to: &Path) {
        let from_key = self.resolve(from);
        let to_key = self.resolve(to);

        if let (Some(from_key), Some(to_key)) = (&from_key, &to_key)
            && from_key == to_key
        {
            self.modified_key(to_key.clone(), to);
            return;
        }

        if let Some(from_key) = from_key {
            self.deleted_key(&from_key);
        }
        if to_key.is_some() {
            self.created(to);
        }
    }

    fn record(&mut self, event: Event) {
        info!("{} {}", event.kind(), event.path());
        self.events.push(event);
    }
}
