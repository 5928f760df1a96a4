use crate::fingerprint::Digest;
use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventKind {
    Added,
    Modified,
    Deleted,
}

impl EventKind {
    pub const ALL: [EventKind; 3] = [EventKind::Added, EventKind::Modified, EventKind::Deleted];

    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Added => "ADDED",
            EventKind::Modified => "MODIFIED",
            EventKind::Deleted => "DELETED",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single recorded content change.
///
/// Events are only built through [`Event::added`], [`Event::modified`] and
/// [`Event::deleted`] (or deserialized), which keeps the digest fields
/// consistent with the kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    kind: EventKind,
    path: String,
    #[serde(rename = "old_hash", default)]
    old_digest: Option<Digest>,
    #[serde(rename = "new_hash", default)]
    new_digest: Option<Digest>,
    #[serde(default = "now", deserialize_with = "timestamp_or_now")]
    timestamp: NaiveDateTime,
}

fn now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

/// A stored `null` timestamp is treated like a missing one.
fn timestamp_or_now<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
    Ok(Option::<NaiveDateTime>::deserialize(deserializer)?.unwrap_or_else(now))
}

impl Event {
    pub fn added(path: String, new_digest: Digest) -> Self {
        Event {
            kind: EventKind::Added,
            path,
            old_digest: None,
            new_digest: Some(new_digest),
            timestamp: now(),
        }
    }

    /// `old_digest` is `None` when the path was not tracked before. Returns
    /// `None` when the digests are equal, since that is not a change.
    pub fn modified(path: String, old_digest: Option<Digest>, new_digest: Digest) -> Option<Self> {
        if old_digest.as_ref() == Some(&new_digest) {
            return None;
        }
        Some(Event {
            kind: EventKind::Modified,
            path,
            old_digest,
            new_digest: Some(new_digest),
            timestamp: now(),
        })
    }

    pub fn deleted(path: String, old_digest: Digest) -> Self {
        Event {
            kind: EventKind::Deleted,
            path,
            old_digest: Some(old_digest),
            new_digest: None,
            timestamp: now(),
        }
    }

    /// Overrides the creation-time timestamp.
    #[allow(dead_code)]
    pub fn at(mut self, timestamp: NaiveDateTime) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn old_digest(&self) -> Option<&Digest> {
        self.old_digest.as_ref()
    }

    pub fn new_digest(&self) -> Option<&Digest> {
        self.new_digest.as_ref()
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    /// Whether the digest fields match the kind. Always true for events
    /// built through the constructors; stored events are checked on load.
    pub fn is_well_formed(&self) -> bool {
        match self.kind {
            EventKind::Added => self.old_digest.is_none() && self.new_digest.is_some(),
            EventKind::Deleted => self.old_digest.is_some() && self.new_digest.is_none(),
            EventKind::Modified => {
                self.new_digest.is_some() && self.old_digest != self.new_digest
            }
        }
    }
}

/// Number of events of each kind, in [`EventKind::ALL`] order.
pub fn count_by_kind(events: &[Event]) -> [(EventKind, usize); 3] {
    EventKind::ALL.map(|kind| (kind, events.iter().filter(|e| e.kind == kind).count()))
}
