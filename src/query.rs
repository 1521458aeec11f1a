//! Read-only queries over the tree.
//!
//! Search works on the loaded index and lives on
//! [`DedupeEngine::search`](crate::dedupe::DedupeEngine::search).

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::scanner::{Walker, WalkerConfig};

/// Result of counting the files under a root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileCount {
    /// Root that was walked
    pub root: PathBuf,
    /// Regular files found
    pub files: usize,
}

impl fmt::Display for FileCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "There are {} files in {}", self.files, self.root.display())
    }
}

/// Count every regular file under `root`, at any depth.
///
/// Directories do not count. Unreadable subtrees are skipped with a warning.
#[must_use]
pub fn count_files(root: &Path, config: WalkerConfig) -> FileCount {
    let files = Walker::new(root, config).count_files();
    log::debug!("Counted {} files under {}", files, root.display());
    FileCount {
        root: root.to_path_buf(),
        files,
    }
}
