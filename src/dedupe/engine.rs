//! Deduplication engine.
//!
//! # Overview
//!
//! [`DedupeEngine`] owns the in-memory [`Index`], the durable store and the
//! hasher for the duration of a run. For every file the walk yields:
//!
//! 1. Hash it (failures are reported and the file is left alone)
//! 2. Drop a stale association if the path was indexed under another digest
//! 3. Look the digest up
//!    - **Miss**: register the path (memory and store)
//!    - **Hit on the same file**: nothing to do
//!    - **Hit on another file**: keep one copy per the copy-marker policy and
//!      remove the other
//!
//! Before anything is removed, the indexed copy is checked to still exist
//! with the recorded content. If it does not, the current file becomes the
//! indexed copy instead, so the last copy of a book is never deleted.
//!
//! # Example
//!
//! ```no_run
//! use ebookdedupe::dedupe::{DedupeEngine, EngineConfig};
//! use ebookdedupe::index::SqliteIndexStore;
//! use std::path::Path;
//!
//! let store = SqliteIndexStore::open(Path::new("ebookinfo.db")).unwrap();
//! let mut engine = DedupeEngine::open(store, EngineConfig::default()).unwrap();
//! let summary = engine.remove_duplicates(Path::new("/books"));
//! println!("{} duplicates removed", summary.removed.len());
//! ```

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::actions::delete::{remove_file, DeleteMode};
use crate::index::{Index, IndexStore, IndexedFile, StoreError};
use crate::progress::ProgressCallback;
use crate::rename::{RenameError, RenameOutcome, Renamer, RenameSummary, SidecarOutcome};
use crate::scanner::path_utils::same_file;
use crate::scanner::{Hasher, Walker, WalkerConfig, DEFAULT_BUFFER_SIZE};

use super::policy::{CopyMarkerPolicy, Survivor, DEFAULT_COPY_MARKERS};
use super::summary::{push_failure, DedupeSummary, FileAction, FileFailure, FileOutcome, RemovedFile};

/// Engine settings.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// File-name substrings that mark a copy
    pub copy_markers: Vec<String>,
    /// How losers are removed
    pub delete_mode: DeleteMode,
    /// Report what would happen without touching files or the store
    pub dry_run: bool,
    /// Hash and deduplicate zero-length files too
    pub include_empty: bool,
    /// Walk settings
    pub walker: WalkerConfig,
    /// Hasher read buffer size in bytes
    pub buffer_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            copy_markers: DEFAULT_COPY_MARKERS.iter().map(ToString::to_string).collect(),
            delete_mode: DeleteMode::Permanent,
            dry_run: false,
            include_empty: false,
            walker: WalkerConfig::default(),
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl EngineConfig {
    /// Set the copy markers.
    #[must_use]
    pub fn with_copy_markers(mut self, markers: Vec<String>) -> Self {
        self.copy_markers = markers;
        self
    }

    /// Set the delete mode.
    #[must_use]
    pub fn with_delete_mode(mut self, mode: DeleteMode) -> Self {
        self.delete_mode = mode;
        self
    }

    /// Enable or disable dry-run mode.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Include zero-length files.
    #[must_use]
    pub fn with_include_empty(mut self, include_empty: bool) -> Self {
        self.include_empty = include_empty;
        self
    }

    /// Set the walker configuration.
    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker = config;
        self
    }

    /// Set the hasher buffer size.
    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }
}

/// Owner of the index and store for one run.
pub struct DedupeEngine<S: IndexStore> {
    index: Index,
    store: S,
    hasher: Hasher,
    policy: CopyMarkerPolicy,
    config: EngineConfig,
    progress: Option<Arc<dyn ProgressCallback>>,
    /// Digests computed during the current pass
    hashed: HashMap<PathBuf, String>,
    /// Paths a dry run would have removed
    planned: HashSet<PathBuf>,
}

impl<S: IndexStore> std::fmt::Debug for DedupeEngine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DedupeEngine")
            .field("indexed", &self.index.len())
            .field("config", &self.config)
            .field("progress", &self.progress.as_ref().map(|_| "<callback>"))
            .finish_non_exhaustive()
    }
}

impl<S: IndexStore> DedupeEngine<S> {
    /// Load the index from `store` and build an engine around it.
    ///
    /// If the store holds several rows for one digest or one path, the first
    /// row wins and the others are ignored with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the records cannot be read.
    pub fn open(store: S, config: EngineConfig) -> Result<Self, StoreError> {
        let records = store.load()?;
        let total = records.len();
        let (index, rejected) = Index::from_records(records);
        for record in &rejected {
            log::warn!(
                "Ignoring conflicting index row: {} ({})",
                record.path.display(),
                record.digest
            );
        }
        log::debug!("Loaded {} of {} index rows", index.len(), total);

        Ok(Self {
            index,
            store,
            hasher: Hasher::with_buffer_size(config.buffer_size),
            policy: CopyMarkerPolicy::new(config.copy_markers.iter().cloned()),
            config,
            progress: None,
            hashed: HashMap::new(),
            planned: HashSet::new(),
        })
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Current in-memory index.
    #[must_use]
    pub fn index(&self) -> &Index {
        &self.index
    }

    /// Underlying store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consume the engine, returning the store.
    #[must_use]
    pub fn into_store(self) -> S {
        self.store
    }

    /// Indexed paths containing `needle`, case-insensitively.
    #[must_use]
    pub fn search(&self, needle: &str) -> Vec<&Path> {
        self.index.search(needle)
    }

    /// Walk `root` and resolve every duplicate found.
    ///
    /// Per-file failures are collected in the returned summary and never
    /// stop the walk.
    pub fn remove_duplicates(&mut self, root: &Path) -> DedupeSummary {
        let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
        let start = Instant::now();
        let mut summary = DedupeSummary::new(root.clone(), self.config.dry_run);
        self.hashed.clear();
        self.planned.clear();

        log::info!(
            "Removing duplicates under {}{}",
            root.display(),
            if self.config.dry_run { " (dry run)" } else { "" }
        );
        if let Some(progress) = &self.progress {
            progress.on_phase_start("dedupe");
        }

        let walker = Walker::new(&root, self.config.walker.clone());
        for entry in walker.walk() {
            match entry {
                Ok(path) => {
                    summary.files_seen += 1;
                    if let Some(progress) = &self.progress {
                        progress.on_progress(summary.files_seen, &path.to_string_lossy());
                    }
                    self.process_file(&path, &mut summary);
                }
                Err(e) => {
                    let path = e.path().to_path_buf();
                    summary.fail(&path, FileAction::Walk, &e);
                }
            }
        }

        if let Some(progress) = &self.progress {
            progress.on_phase_end("dedupe");
        }
        summary.duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        log::info!(
            "Seen {} files: {} registered, {} duplicates removed",
            summary.files_seen,
            summary.registered,
            summary.removed.len()
        );
        summary
    }

    /// Run one file through the hash / lookup / resolve cycle.
    ///
    /// Counters in `summary` are updated to match the returned outcome.
    pub fn process_file(&mut self, path: &Path, summary: &mut DedupeSummary) -> FileOutcome {
        if self.planned.contains(path) {
            log::debug!("Already planned for removal: {}", path.display());
            return FileOutcome::Skipped;
        }

        let size = match fs::metadata(path) {
            Ok(metadata) => metadata.len(),
            Err(e) => {
                summary.fail(path, FileAction::Hash, &e);
                return FileOutcome::Failed;
            }
        };
        if size == 0 && !self.config.include_empty {
            log::debug!("Skipping empty file: {}", path.display());
            summary.skipped_empty += 1;
            return FileOutcome::Skipped;
        }

        let digest = match self.hasher.full_hash(path) {
            Ok(digest) => digest,
            Err(e) => {
                summary.fail(path, FileAction::Hash, &e);
                return FileOutcome::Failed;
            }
        };
        log::trace!("{} {}", digest, path.display());
        self.hashed.insert(path.to_path_buf(), digest.clone());

        // Content changed since the path was indexed
        if self.index.digest_of(path).is_some_and(|d| d != digest) {
            log::debug!("Content changed: {}", path.display());
            self.index.remove_path(path);
            self.persist_forget(path, &mut summary.failures);
        }

        let Some(existing) = self.index.lookup(&digest).map(Path::to_path_buf) else {
            let file = IndexedFile::new(path, digest);
            self.persist_record(&file, &mut summary.failures);
            self.index.insert(file);
            summary.registered += 1;
            return FileOutcome::Registered;
        };

        if same_file(&existing, path) {
            summary.unchanged += 1;
            return FileOutcome::Unchanged;
        }

        if !self.still_holds(&existing, &digest) {
            log::info!(
                "Indexed copy {} is gone or changed, keeping {}",
                existing.display(),
                path.display()
            );
            self.repoint(&digest, &existing, path, &mut summary.failures);
            summary.repointed += 1;
            return FileOutcome::Repointed { previous: existing };
        }

        let resolution = self.policy.resolve(&existing, path);
        let (keep, remove) = (resolution.keep.to_path_buf(), resolution.remove.to_path_buf());

        let removed_size = if self.config.dry_run {
            log::info!("Would remove {} (duplicate of {})", remove.display(), keep.display());
            self.planned.insert(remove.clone());
            size
        } else {
            match remove_file(&remove, self.config.delete_mode) {
                Ok(result) => result.size,
                Err(e) => {
                    summary.fail(&remove, FileAction::Remove, &e);
                    return FileOutcome::Failed;
                }
            }
        };

        if resolution.survivor == Survivor::Current {
            self.repoint(&digest, &existing, path, &mut summary.failures);
        }

        let removed = RemovedFile {
            path: remove,
            kept: keep,
            digest,
            size: removed_size,
        };
        summary.removed.push(removed.clone());
        FileOutcome::Removed(removed)
    }

    /// Normalize the names of every book at or under `target`.
    ///
    /// Index records follow renamed files.
    pub fn rename_books(&mut self, target: &Path, renamer: &Renamer) -> RenameSummary {
        let target = target.canonicalize().unwrap_or_else(|_| target.to_path_buf());
        let mut summary = RenameSummary::default();

        // Collected up front: the walk must not observe its own renames
        let walker = Walker::new(&target, self.config.walker.clone());
        let mut paths = Vec::new();
        for entry in walker.walk() {
            match entry {
                Ok(path) => paths.push(path),
                Err(e) => push_failure(&mut summary.failures, e.path(), FileAction::Walk, &e),
            }
        }

        if let Some(progress) = &self.progress {
            progress.on_phase_start("rename");
        }
        for (n, path) in paths.iter().enumerate() {
            if let Some(progress) = &self.progress {
                progress.on_progress(n + 1, &path.to_string_lossy());
            }
            if !renamer.is_supported(path) {
                log::debug!("Not a .{} file, skipping: {}", renamer.book_extension(), path.display());
                summary.skipped.push(path.clone());
                continue;
            }

            match renamer.rename_file(path) {
                Ok(RenameOutcome::AlreadyNormalized(_)) => summary.unchanged += 1,
                Ok(RenameOutcome::Renamed(book)) => {
                    self.follow_rename(&book.from, &book.to, &mut summary.failures);
                    match &book.sidecar {
                        Some(SidecarOutcome::Renamed { from, to }) => {
                            self.follow_rename(from, to, &mut summary.failures);
                        }
                        Some(SidecarOutcome::Failed { path, message }) => {
                            push_failure(
                                &mut summary.failures,
                                path,
                                FileAction::RenameSidecar,
                                message,
                            );
                        }
                        None => {}
                    }
                    summary.renamed.push(book);
                }
                Err(e) => {
                    let action = rename_action(&e);
                    push_failure(&mut summary.failures, path, action, &e);
                }
            }
        }
        if let Some(progress) = &self.progress {
            progress.on_phase_end("rename");
        }

        log::info!(
            "Renamed {} books ({} already normalized, {} failed)",
            summary.renamed.len(),
            summary.unchanged,
            summary.failures.len()
        );
        summary
    }

    /// Whether `existing` is still a regular file with content `digest`.
    fn still_holds(&mut self, existing: &Path, digest: &str) -> bool {
        match fs::symlink_metadata(existing) {
            Ok(metadata) if metadata.is_file() => {}
            _ => return false,
        }
        if let Some(known) = self.hashed.get(existing) {
            return known == digest;
        }
        match self.hasher.full_hash(existing) {
            Ok(actual) => {
                let matches = actual == digest;
                self.hashed.insert(existing.to_path_buf(), actual);
                matches
            }
            Err(e) => {
                log::warn!("Cannot verify indexed copy {}: {}", existing.display(), e);
                false
            }
        }
    }

    /// Make `new_path` the indexed copy of `digest` in place of `old_path`.
    fn repoint(
        &mut self,
        digest: &str,
        old_path: &Path,
        new_path: &Path,
        failures: &mut Vec<FileFailure>,
    ) {
        self.index.repoint(digest, new_path);
        self.persist_forget(old_path, failures);
        self.persist_record(&IndexedFile::new(new_path, digest), failures);
    }

    /// Move the record of a renamed file, if it has one.
    fn follow_rename(&mut self, from: &Path, to: &Path, failures: &mut Vec<FileFailure>) {
        if let Some(digest) = self.index.relocate(from, to) {
            self.persist_forget(from, failures);
            self.persist_record(&IndexedFile::new(to, digest), failures);
        }
    }

    fn persist_record(&mut self, file: &IndexedFile, failures: &mut Vec<FileFailure>) {
        if self.config.dry_run {
            return;
        }
        if let Err(e) = self.store.record(file) {
            push_failure(failures, &file.path, FileAction::Record, &e);
        }
    }

    fn persist_forget(&mut self, path: &Path, failures: &mut Vec<FileFailure>) {
        if self.config.dry_run {
            return;
        }
        if let Err(e) = self.store.forget(path) {
            push_failure(failures, path, FileAction::Forget, &e);
        }
    }
}

fn rename_action(error: &RenameError) -> FileAction {
    if error.is_parse_error() {
        FileAction::Metadata
    } else {
        FileAction::Rename
    }
}
