//! JSON persistence for baselines and event logs.
//!
//! Baselines are stored as `{ "baseline": { "<path>": "<digest>", ... } }`
//! and event logs as `{ "events": [ ... ] }`. Both are written atomically.

use crate::event::Event;
use crate::snapshot::Snapshot;
use crate::util::paths::relative_key;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0} does not exist")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(std::io::Error),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("Corrupt file {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Invalid baseline path {key:?} in {path}")]
    InvalidKey { path: PathBuf, key: String },
    #[error("JSON serialization error: {0}")]
    Serialize(serde_json::Error),
    #[error("Malformed {kind} event for {event_path} in {path}")]
    MalformedEvent {
        path: PathBuf,
        kind: crate::event::EventKind,
        event_path: String,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct BaselineFile {
    #[serde(default)]
    baseline: Snapshot,
}

#[derive(Debug, Serialize, Deserialize)]
struct EventLogFile {
    #[serde(default)]
    events: Vec<Event>,
}

/// Loads a baseline, failing with `NotFound` if there is none at `path`.
///
/// Every key must be a normalized root-relative path, the same form a scan
/// produces. Anything else (absolute paths, `..`, stray separators) is
/// rejected with `InvalidKey`.
pub fn load_baseline(path: &Path) -> Result<Snapshot, StoreError> {
    let content = read(path)?;
    let file: BaselineFile = parse(path, &content)?;

    if let Some(bad) = file
        .baseline
        .paths()
        .find(|key| relative_key(Path::new(key)).as_deref() != Some(*key))
    {
        return Err(StoreError::InvalidKey {
            path: path.to_path_buf(),
            key: bad.to_string(),
        });
    }

    Ok(file.baseline)
}

pub fn save_baseline(baseline: &Snapshot, path: &Path) -> Result<(), StoreError> {
    let file = BaselineFile {
        baseline: baseline.clone(),
    };
    write_json(&file, path)
}

/// Loads an event log. A log that does not exist yet is empty.
pub fn load_events(path: &Path) -> Result<Vec<Event>, StoreError> {
    let content = match read(path) {
        Ok(content) => content,
        Err(StoreError::NotFound(_)) => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };
    let file: EventLogFile = parse(path, &content)?;

    if let Some(bad) = file.events.iter().find(|e| !e.is_well_formed()) {
        return Err(StoreError::MalformedEvent {
            path: path.to_path_buf(),
            kind: bad.kind(),
            event_path: bad.path().to_string(),
        });
    }

    Ok(file.events)
}

pub fn save_events(events: &[Event], path: &Path) -> Result<(), StoreError> {
    let file = EventLogFile {
        events: events.to_vec(),
    };
    write_json(&file, path)
}

fn classify_io(path: &Path, e: std::io::Error) -> StoreError {
    match e.kind() {
        ErrorKind::NotFound => StoreError::NotFound(path.to_path_buf()),
        ErrorKind::PermissionDenied => StoreError::PermissionDenied(path.to_path_buf()),
        _ => StoreError::Io(e),
    }
}

fn read(path: &Path) -> Result<String, StoreError> {
    std::fs::read_to_string(path).map_err(|e| classify_io(path, e))
}

fn parse<T: for<'de> Deserialize<'de>>(path: &Path, content: &str) -> Result<T, StoreError> {
    serde_json::from_str(content).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes `value` as pretty JSON to `path` atomically.
///
/// Writes to a temporary file in the destination directory, fsyncs it, then
/// renames it into place. Missing parent directories are created.
pub(crate) fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<(), StoreError> {
    let mut content = serde_json::to_string_pretty(value).map_err(StoreError::Serialize)?;
    content.push('\n');
    write_atomic(content.as_bytes(), path)
}

pub(crate) fn write_atomic(content: &[u8], path: &Path) -> Result<(), StoreError> {
    use std::io::Write;

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(|e| classify_io(parent, e))?;

    let mut temp_file =
        tempfile::NamedTempFile::new_in(parent).map_err(|e| classify_io(parent, e))?;

    temp_file
        .write_all(content)
        .map_err(|e| classify_io(path, e))?;

    temp_file.as_file().sync_all().map_err(StoreError::Io)?;

    temp_file
        .persist(path)
        .map_err(|e| classify_io(path, e.error))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;
    use crate::fingerprint::digest_bytes;
    use std::fs;
    use tempfile::TempDir;

    fn sample_baseline() -> Snapshot {
        [
            ("a.txt".to_string(), digest_bytes(b"a")),
            ("dir/b.txt".to_string(), digest_bytes(b"b")),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_load_and_save_baseline() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("baseline.json");

        save_baseline(&sample_baseline(), &path).unwrap();
        let loaded = load_baseline(&path).unwrap();

        assert_eq!(loaded, sample_baseline());
    }

    #[test]
    fn test_baseline_on_disk_shape() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("baseline.json");

        save_baseline(&sample_baseline(), &path).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();

        assert_eq!(value["baseline"]["a.txt"], digest_bytes(b"a").as_str());
        assert_eq!(value["baseline"]["dir/b.txt"], digest_bytes(b"b").as_str());
    }

    #[test]
    fn test_missing_baseline_is_not_found() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nope.json");

        assert!(matches!(load_baseline(&path), Err(StoreError::NotFound(p)) if p == path));
    }

    #[test]
    fn test_corrupt_baseline_is_a_json_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("baseline.json");
        fs::write(&path, "{\"baseline\": {\"a.txt\": ").unwrap();

        assert!(matches!(load_baseline(&path), Err(StoreError::Json { .. })));
    }

    #[test]
    fn test_baseline_with_bad_digest_is_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("baseline.json");
        fs::write(&path, r#"{"baseline": {"a.txt": "not-a-digest"}}"#).unwrap();

        assert!(matches!(load_baseline(&path), Err(StoreError::Json { .. })));
    }

    #[test]
    fn test_baseline_with_unsafe_path_is_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("baseline.json");
        let digest = digest_bytes(b"x");

        for key in ["../x", "/etc/passwd", "a/../b", "./a", "a//b", "dir/", ""] {
            fs::write(&path, format!(r#"{{"baseline": {{"{key}": "{digest}"}}}}"#)).unwrap();

            assert!(
                matches!(load_baseline(&path), Err(StoreError::InvalidKey { key: ref k, .. }) if k == key),
                "{key:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_baseline_without_key_is_empty() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("baseline.json");
        fs::write(&path, "{}").unwrap();

        assert!(load_baseline(&path).unwrap().is_empty());
    }

    #[test]
    fn test_missing_event_log_is_empty() {
        let temp = TempDir::new().unwrap();

        let events = load_events(&temp.path().join("events.json")).unwrap();

        assert!(events.is_empty());
    }

    #[test]
    fn test_events_round_trip_preserves_order_and_timestamps() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/dir/events.json");

        let events = vec![
            Event::added("z.txt".into(), digest_bytes(b"z")),
            Event::modified("a.txt".into(), Some(digest_bytes(b"a")), digest_bytes(b"a2")).unwrap(),
            Event::deleted("m.txt".into(), digest_bytes(b"m")),
        ];

        save_events(&events, &path).unwrap();
        let loaded = load_events(&path).unwrap();

        assert_eq!(loaded, events);
        assert_eq!(
            loaded.iter().map(Event::kind).collect::<Vec<_>>(),
            vec![EventKind::Added, EventKind::Modified, EventKind::Deleted]
        );
    }

    #[test]
    fn test_malformed_stored_event_is_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("events.json");
        fs::write(
            &path,
            r#"{"events": [{"type": "DELETED", "path": "x", "old_hash": null, "new_hash": null, "timestamp": "2025-01-15T10:30:00"}]}"#,
        )
        .unwrap();

        assert!(matches!(
            load_events(&path),
            Err(StoreError::MalformedEvent { kind: EventKind::Deleted, .. })
        ));
    }

    #[test]
    fn test_save_replaces_existing_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("baseline.json");

        save_baseline(&sample_baseline(), &path).unwrap();
        save_baseline(&Snapshot::new(), &path).unwrap();

        assert!(load_baseline(&path).unwrap().is_empty());
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
    }
}
