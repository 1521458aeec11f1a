//! Run reports.
//!
//! Per-file failures never abort a run. Each one is logged and also stored
//! here as a [`FileFailure`], so callers (and tests) can inspect exactly
//! which path failed and during which action.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// The per-file step that was being attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileAction {
    /// Enumerating the directory tree
    Walk,
    /// Reading the file to compute its digest
    Hash,
    /// Persisting an index record
    Record,
    /// Removing an index record
    Forget,
    /// Deleting a duplicate copy
    Remove,
    /// Reading e-book metadata
    Metadata,
    /// Renaming a book
    Rename,
    /// Renaming the companion file of a book
    RenameSidecar,
}

impl fmt::Display for FileAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Walk => "walk",
            Self::Hash => "hash",
            Self::Record => "record",
            Self::Forget => "forget",
            Self::Remove => "remove",
            Self::Metadata => "metadata",
            Self::Rename => "rename",
            Self::RenameSidecar => "rename sidecar",
        };
        f.write_str(name)
    }
}

/// A failure isolated to one path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    /// Offending path
    pub path: PathBuf,
    /// Action that failed
    pub action: FileAction,
    /// Human-readable cause
    pub message: String,
}

impl FileFailure {
    /// Create a failure record.
    #[must_use]
    pub fn new(path: &Path, action: FileAction, error: &dyn fmt::Display) -> Self {
        Self {
            path: path.to_path_buf(),
            action,
            message: error.to_string(),
        }
    }
}

/// Push a failure onto `failures`, logging it.
pub(crate) fn push_failure(
    failures: &mut Vec<FileFailure>,
    path: &Path,
    action: FileAction,
    error: &dyn fmt::Display,
) {
    log::warn!("{} failed for {}: {}", action, path.display(), error);
    failures.push(FileFailure::new(path, action, error));
}

/// A duplicate that was removed (or would be, in a dry run).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemovedFile {
    /// Path that was removed
    pub path: PathBuf,
    /// Path that was kept
    pub kept: PathBuf,
    /// Shared content digest
    pub digest: String,
    /// Size in bytes
    pub size: u64,
}

/// What happened to a single walked file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// New digest; the path is now indexed.
    Registered,
    /// The path is already the indexed copy of its digest.
    Unchanged,
    /// The indexed copy was missing or changed; this path replaced it.
    Repointed {
        /// Previously recorded path
        previous: PathBuf,
    },
    /// A duplicate pair was resolved.
    Removed(RemovedFile),
    /// The file was not considered (empty, or already removed in a dry run).
    Skipped,
    /// A per-file failure; see the summary's failure list.
    Failed,
}

/// Report of one remove-duplicates run.
#[derive(Debug, Clone, Serialize)]
pub struct DedupeSummary {
    /// Root that was walked
    pub root: PathBuf,
    /// Start of the run
    pub started_at: DateTime<Utc>,
    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,
    /// Whether filesystem and store changes were suppressed
    pub dry_run: bool,
    /// Regular files yielded by the walk
    pub files_seen: usize,
    /// Files newly added to the index
    pub registered: usize,
    /// Files that were already the indexed copy
    pub unchanged: usize,
    /// Files that replaced a missing or changed indexed copy
    pub repointed: usize,
    /// Empty files that were not hashed
    pub skipped_empty: usize,
    /// Removed duplicates
    pub removed: Vec<RemovedFile>,
    /// Isolated per-file failures
    pub failures: Vec<FileFailure>,
}

impl DedupeSummary {
    /// Start a new report.
    #[must_use]
    pub fn new(root: PathBuf, dry_run: bool) -> Self {
        Self {
            root,
            started_at: Utc::now(),
            duration_ms: 0,
            dry_run,
            files_seen: 0,
            registered: 0,
            unchanged: 0,
            repointed: 0,
            skipped_empty: 0,
            removed: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Record a failure, logging it.
    pub fn fail(&mut self, path: &Path, action: FileAction, error: &dyn fmt::Display) {
        push_failure(&mut self.failures, path, action, error);
    }

    /// Total bytes of removed duplicates.
    #[must_use]
    pub fn bytes_freed(&self) -> u64 {
        self.removed.iter().map(|r| r.size).sum()
    }

    /// Whether any per-file step failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Failures for a given action.
    pub fn failures_for(&self, action: FileAction) -> impl Iterator<Item = &FileFailure> + '_ {
        self.failures.iter().filter(move |f| f.action == action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_freed() {
        let mut summary = DedupeSummary::new(PathBuf::from("/b"), false);
        summary.removed.push(RemovedFile {
            path: "/b/a (1).epub".into(),
            kept: "/b/a.epub".into(),
            digest: "aa".into(),
            size: 100,
        });
        summary.removed.push(RemovedFile {
            path: "/b/c.epub".into(),
            kept: "/d/c.epub".into(),
            digest: "cc".into(),
            size: 50,
        });
        assert_eq!(summary.bytes_freed(), 150);
    }

    #[test]
    fn test_fail_records_action() {
        let mut summary = DedupeSummary::new(PathBuf::from("/b"), false);
        summary.fail(Path::new("/b/x.epub"), FileAction::Hash, &"boom");

        assert!(summary.has_failures());
        let failure = summary.failures_for(FileAction::Hash).next().unwrap();
        assert_eq!(failure.path, PathBuf::from("/b/x.epub"));
        assert_eq!(failure.message, "boom");
        assert_eq!(summary.failures_for(FileAction::Remove).count(), 0);
    }

    #[test]
    fn test_action_serializes_snake_case() {
        let json = serde_json::to_string(&FileAction::RenameSidecar).unwrap();
        assert_eq!(json, "\"rename_sidecar\"");
        assert_eq!(FileAction::RenameSidecar.to_string(), "rename sidecar");
    }
}
