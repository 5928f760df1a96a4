//! Watch sessions: platform notifications in, reconciled baseline out.
//!
//! The `notify` watcher delivers raw events on its own thread into a
//! channel. The session drains that channel on the calling thread, turning
//! each raw event into zero or more [`Notification`]s and applying them to
//! the [`Reconciler`] one at a time, in delivery order, until cancelled.

use crate::fingerprint::fingerprint;
use crate::reconcile::{DigestSource, Notification, Reconciler, SessionOutcome};
use crate::snapshot::Snapshot;
use notify::event::{CreateKind, ModifyKind, RemoveKind, RenameMode};
use notify::{EventKind, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;
use tracing::{debug, info, warn};

/// How often the session checks for cancellation while idle.
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("Failed to watch {path}: {source}")]
    Watcher {
        path: PathBuf,
        source: notify::Error,
    },
    #[error("Failed to install interrupt handler: {0}")]
    Interrupt(#[from] ctrlc::Error),
}

/// Returns a flag that becomes true once the process receives Ctrl-C.
pub fn interrupt_flag() -> Result<Arc<AtomicBool>, WatchError> {
    let flag = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&flag);
    ctrlc::set_handler(move || {
        handler_flag.store(true, Ordering::SeqCst);
    })?;
    Ok(flag)
}

/// Watches `root` (canonical) starting from `baseline` until `cancel` is set.
pub fn watch_tree(
    root: &Path,
    baseline: Snapshot,
    cancel: &AtomicBool,
) -> Result<SessionOutcome, WatchError> {
    let (tx, rx) = mpsc::channel();
    let watcher_error = |source| WatchError::Watcher {
        path: root.to_path_buf(),
        source,
    };

    let mut watcher = notify::recommended_watcher(move |res| {
        if tx.send(res).is_err() {
            debug!("Dropping watch event after session end");
        }
    })
    .map_err(watcher_error)?;

    watcher
        .watch(root, RecursiveMode::Recursive)
        .map_err(watcher_error)?;

    info!("Watching {} ({} files tracked)", root.display(), baseline.len());

    let reconciler = Reconciler::new(root.to_path_buf(), baseline, fingerprint);
    Ok(run_session(reconciler, &rx, cancel, move || drop(watcher)))
}

/// Applies raw events from `rx` until `cancel` is set or the sender goes
/// away.
///
/// Once the loop stops, `detach` is called to disconnect the event producer.
/// Events queued by then are applied before returning; anything that arrives
/// while they are being applied is left in the channel.
pub fn run_session<S: DigestSource>(
    mut reconciler: Reconciler<S>,
    rx: &Receiver<notify::Result<notify::Event>>,
    cancel: &AtomicBool,
    detach: impl FnOnce(),
) -> SessionOutcome {
    while !cancel.load(Ordering::SeqCst) {
        match rx.recv_timeout(CANCEL_POLL_INTERVAL) {
            Ok(raw) => handle_raw(&mut reconciler, raw),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                warn!("Watcher channel disconnected");
                break;
            }
        }
    }

    detach();

    let pending: Vec<_> = rx.try_iter().collect();
    debug!("Applying {} queued watch events", pending.len());
    for raw in pending {
        handle_raw(&mut reconciler, raw);
    }

    info!(
        "Watch session ended with {} events, {} files tracked",
        reconciler.events().len(),
        reconciler.baseline().len()
    );
    reconciler.finish()
}

fn handle_raw<S: DigestSource>(
    reconciler: &mut Reconciler<S>,
    raw: notify::Result<notify::Event>,
) {
    match raw {
        Ok(event) => {
            for notification in normalize(event) {
                reconciler.apply(notification);
            }
        }
        Err(e) => warn!("Watch error: {}", e),
    }
}

/// Maps a platform event onto reconciler notifications.
///
/// Directory events and pure accesses produce nothing. Backends that track
/// renames (inotify) report a rename as a `From` half, a `To` half and then a
/// combined `Both` event carrying the same tracker; the halves are enough on
/// their own, so a tracked `Both` is dropped. An untracked `Both` is a real
/// rename notification.
pub fn normalize(event: notify::Event) -> Vec<Notification> {
    let notify::Event { kind, paths, attrs } = event;

    match kind {
        EventKind::Create(CreateKind::Folder) | EventKind::Remove(RemoveKind::Folder) => {
            Vec::new()
        }
        EventKind::Create(_) => paths.into_iter().map(Notification::Created).collect(),
        EventKind::Remove(_) => paths.into_iter().map(Notification::Deleted).collect(),
        EventKind::Modify(ModifyKind::Name(mode)) => match mode {
            RenameMode::From => paths.into_iter().map(Notification::Deleted).collect(),
            RenameMode::To => paths.into_iter().map(Notification::Created).collect(),
            RenameMode::Both if attrs.tracker().is_some() => Vec::new(),
            RenameMode::Both if paths.len() == 2 => {
                let mut paths = paths.into_iter();
                match (paths.next(), paths.next()) {
                    (Some(from), Some(to)) => vec![Notification::Renamed { from, to }],
                    _ => Vec::new(),
                }
            }
            _ => paths
                .into_iter()
                .map(|path| {
                    if path.exists() {
                        Notification::Modified(path)
                    } else {
                        Notification::Deleted(path)
                    }
                })
                .collect(),
        },
        EventKind::Modify(_) => paths.into_iter().map(Notification::Modified).collect(),
        EventKind::Access(_) | EventKind::Any | EventKind::Other => Vec::new(),
    }
}
