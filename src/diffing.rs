use crate::fingerprint::Digest;
use crate::snapshot::Snapshot;
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modification {
    pub path: String,
    pub old_digest: Digest,
    pub new_digest: Digest,
}

/// Classified differences between a baseline and a current snapshot. Each
/// list is sorted by path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffResult {
    pub modified: Vec<Modification>,
    /// In the baseline but not in the current snapshot.
    pub missing: Vec<String>,
    /// In the current snapshot but not in the baseline.
    pub extra: Vec<String>,
}

impl DiffResult {
    pub fn total_issues(&self) -> usize {
        self.modified.len() + self.missing.len() + self.extra.len()
    }

    pub fn is_clean(&self) -> bool {
        self.total_issues() == 0
    }
}

/// Compares `current` against `baseline`.
///
/// Both snapshots iterate in path order, so this is a single merge pass over
/// the two sides. Neither side is modified.
pub fn diff(baseline: &Snapshot, current: &Snapshot) -> DiffResult {
    let mut result = DiffResult::default();

    let mut old_iter = baseline.iter().peekable();
    let mut new_iter = current.iter().peekable();

    loop {
        let order = match (old_iter.peek(), new_iter.peek()) {
            (None, None) => break,
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (Some((old_path, _)), Some((new_path, _))) => old_path.cmp(new_path),
        };

        match order {
            Ordering::Less => {
                if let Some((path, _)) = old_iter.next() {
                    result.missing.push(path.clone());
                }
            }
            Ordering::Greater => {
                if let Some((path, _)) = new_iter.next() {
                    result.extra.push(path.clone());
                }
            }
            Ordering::Equal => {
                if let (Some((path, old_digest)), Some((_, new_digest))) =
                    (old_iter.next(), new_iter.next())
                    && old_digest != new_digest
                {
                    result.modified.push(Modification {
                        path: path.clone(),
                        old_digest: old_digest.clone(),
                        new_digest: new_digest.clone(),
                    });
                }
            }
        }
    }

    result
}

pub fn print_diff(result: &DiffResult) {
    for line in format_diff_lines(result) {
        println!("{}", line);
    }
}

/// Status lines in the order: modified, missing, extra.
fn format_diff_lines(result: &DiffResult) -> Vec<String> {
    let mut lines = Vec::new();

    for modification in &result.modified {
        lines.push(format!("{:<2} {}", "M", modification.path));
        lines.push(format!(
            "   sha256: {} -> {}",
            truncate_sha256(&modification.old_digest),
            truncate_sha256(&modification.new_digest)
        ));
    }
    for path in &result.missing {
        lines.push(format!("{:<2} {}", "R", path));
    }
    for path in &result.extra {
        lines.push(format!("{:<2} {}", "A", path));
    }

    lines
}

fn truncate_sha256(digest: &Digest) -> String {
    format!("{}...", digest.short(12))
}
