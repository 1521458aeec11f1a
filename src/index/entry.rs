//! Index record and in-memory index.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::scanner::path_utils::{normalize_query, search_key};

/// One digest → path association.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedFile {
    /// Recorded path of the canonical copy
    pub path: PathBuf,
    /// Lowercase hex content digest
    pub digest: String,
}

impl IndexedFile {
    /// Create a new record.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, digest: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            digest: digest.into(),
        }
    }
}

/// In-memory working set of indexed files.
///
/// Both directions are kept so that a path is never associated with two
/// digests and a digest never with two paths.
#[derive(Debug, Clone, Default)]
pub struct Index {
    by_digest: HashMap<String, PathBuf>,
    by_path: HashMap<PathBuf, String>,
}

impl Index {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from durable records, in load order.
    ///
    /// The first record wins for any digest or path that appears more than
    /// once; the losing records are returned so the caller can report them.
    #[must_use]
    pub fn from_records<I>(records: I) -> (Self, Vec<IndexedFile>)
    where
        I: IntoIterator<Item = IndexedFile>,
    {
        let mut index = Self::new();
        let mut rejected = Vec::new();

        for record in records {
            if index.by_digest.contains_key(&record.digest) || index.by_path.contains_key(&record.path)
            {
                rejected.push(record);
            } else {
                index.link(record.path, record.digest);
            }
        }

        (index, rejected)
    }

    /// Number of indexed files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_digest.len()
    }

    /// Whether the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_digest.is_empty()
    }

    /// Path recorded for a digest.
    #[must_use]
    pub fn lookup(&self, digest: &str) -> Option<&Path> {
        self.by_digest.get(digest).map(PathBuf::as_path)
    }

    /// Digest recorded for a path.
    #[must_use]
    pub fn digest_of(&self, path: &Path) -> Option<&str> {
        self.by_path.get(path).map(String::as_str)
    }

    /// Register a new file.
    ///
    /// Returns `false` and leaves the index unchanged if the digest is
    /// already present. A previous association of the same path with another
    /// digest is replaced.
    pub fn insert(&mut self, file: IndexedFile) -> bool {
        if self.by_digest.contains_key(&file.digest) {
            return false;
        }
        self.remove_path(&file.path);
        self.link(file.path, file.digest);
        true
    }

    /// Remove whatever record holds `path`.
    pub fn remove_path(&mut self, path: &Path) -> Option<IndexedFile> {
        let digest = self.by_path.remove(path)?;
        self.by_digest.remove(&digest);
        Some(IndexedFile::new(path, digest))
    }

    /// Point an existing digest at a different path.
    ///
    /// Returns the previously recorded path, or `None` (and does nothing) if
    /// the digest is not indexed.
    pub fn repoint(&mut self, digest: &str, new_path: &Path) -> Option<PathBuf> {
        let old_path = self.by_digest.get(digest)?.clone();
        if old_path == new_path {
            return Some(old_path);
        }
        self.by_path.remove(&old_path);
        self.remove_path(new_path);
        self.link(new_path.to_path_buf(), digest.to_string());
        Some(old_path)
    }

    /// Move the record held by `old_path` to `new_path`.
    ///
    /// Returns the digest that moved, or `None` if `old_path` was not indexed.
    pub fn relocate(&mut self, old_path: &Path, new_path: &Path) -> Option<String> {
        let digest = self.by_path.get(old_path)?.clone();
        self.repoint(&digest, new_path);
        Some(digest)
    }

    /// Recorded paths whose lowercased form contains `needle`.
    ///
    /// Matching is a plain case-insensitive substring test; results are
    /// sorted for stable output.
    #[must_use]
    pub fn search(&self, needle: &str) -> Vec<&Path> {
        let needle = normalize_query(needle);
        let mut hits: Vec<&Path> = self
            .by_path
            .keys()
            .filter(|path| search_key(path).contains(&needle))
            .map(PathBuf::as_path)
            .collect();
        hits.sort();
        hits
    }

    /// Iterate over all records in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> + '_ {
        self.by_digest
            .iter()
            .map(|(digest, path)| (digest.as_str(), path.as_path()))
    }

    /// All records, sorted by path.
    #[must_use]
    pub fn files(&self) -> Vec<IndexedFile> {
        let mut files: Vec<IndexedFile> = self
            .iter()
            .map(|(digest, path)| IndexedFile::new(path, digest))
            .collect();
        files.sort_by(|a, b| a.path.cmp(&b.path));
        files
    }

    fn link(&mut self, path: PathBuf, digest: String) {
        self.by_path.insert(path.clone(), digest.clone());
        self.by_digest.insert(digest, path);
    }
}
