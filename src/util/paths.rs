//! Root-relative path keys.
//!
//! Snapshot keys are UTF-8 strings joined with `/`, relative to the tree
//! root, with no `.`, `..`, root or prefix components. Everything that turns
//! a filesystem path into a key goes through here.

use std::path::{Component, Path, PathBuf};

/// Turns an already root-relative path into a snapshot key.
///
/// Returns `None` for paths that are empty, not valid UTF-8, or contain
/// anything other than normal components.
pub(crate) fn relative_key(relative: &Path) -> Option<String> {
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?),
            _ => return None,
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// Resolves `path` and returns its key if it lies strictly under `root`.
///
/// `root` must already be canonical, and `path` is expected to be spelled
/// under it (as the watcher reports it). The path is normalized lexically,
/// so it keeps its own name even if it is a link. Paths that are, or pass
/// through, a symlink below the root are rejected: snapshots never contain
/// them, and following one would attribute the target's content to the
/// wrong key.
pub(crate) fn resolve_under_root(root: &Path, path: &Path) -> Option<String> {
    let normalized = normalize_lexically(path);
    let relative = normalized.strip_prefix(root).ok()?;
    let key = relative_key(relative)?;

    if crosses_symlink(root, relative) {
        return None;
    }
    Some(key)
}

fn crosses_symlink(root: &Path, relative: &Path) -> bool {
    let mut current = root.to_path_buf();
    relative.components().any(|component| {
        current.push(component);
        current
            .symlink_metadata()
            .is_ok_and(|metadata| metadata.file_type().is_symlink())
    })
}

fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
