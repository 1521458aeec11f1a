//! Directory walker implementation using walkdir.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct for enumerating every regular
//! file under a root directory. Traversal is iterative (walkdir keeps an
//! explicit stack of open directories), so deeply nested trees do not grow
//! the call stack.
//!
//! # Behavior
//!
//! - Every regular file is yielded exactly once, at any depth
//! - Directories are never yielded
//! - Unreadable directories and files are reported as [`ScanError`] items
//!   (and logged as warnings) instead of aborting the walk
//! - Symbolic links are skipped with a warning unless link following is
//!   enabled; link cycles are reported as [`ScanError::SymlinkLoop`]
//! - A walk is not restartable: call [`Walker::walk`] again for a fresh pass
//!
//! # Example
//!
//! ```no_run
//! use ebookdedupe::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("/home/user/Books"), WalkerConfig::default());
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(path) => println!("{}", path.display()),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use super::{ScanError, WalkerConfig};

/// Directory walker for file discovery.
#[derive(Debug, Clone)]
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
}

impl Walker {
    /// Create a new walker for the given path.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use ebookdedupe::scanner::{Walker, WalkerConfig};
    /// use std::path::Path;
    ///
    /// let walker = Walker::new(Path::new("."), WalkerConfig::default());
    /// ```
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
        }
    }

    /// Root directory of this walker.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Walk the directory tree, yielding regular file paths.
    ///
    /// Errors are yielded as [`ScanError`] values rather than stopping
    /// iteration. A root that is itself a regular file yields just that file.
    pub fn walk(&self) -> impl Iterator<Item = Result<PathBuf, ScanError>> + '_ {
        let skip_hidden = self.config.skip_hidden;

        let walk_dir = WalkDir::new(&self.root)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name();

        walk_dir
            .into_iter()
            .filter_entry(move |entry| !(skip_hidden && entry.depth() > 0 && is_hidden(entry)))
            .filter_map(move |entry_result| match entry_result {
                Ok(entry) => self.process_entry(entry),
                Err(e) => Some(Err(self.handle_walk_error(e))),
            })
    }

    /// Count the regular files under the root.
    ///
    /// Unreadable subtrees are skipped (and logged) rather than failing.
    #[must_use]
    pub fn count_files(&self) -> usize {
        self.walk().filter(Result::is_ok).count()
    }

    /// Decide whether a walk entry is a file to yield.
    fn process_entry(&self, entry: DirEntry) -> Option<Result<PathBuf, ScanError>> {
        let file_type = entry.file_type();

        if file_type.is_dir() {
            return None;
        }

        if file_type.is_symlink() {
            // Only reachable when links are not followed
            log::warn!("Skipping symlink: {}", entry.path().display());
            return None;
        }

        if !file_type.is_file() {
            log::trace!("Skipping non-regular file: {}", entry.path().display());
            return None;
        }

        Some(Ok(entry.into_path()))
    }

    /// Convert a walkdir error into a [`ScanError`], logging it.
    fn handle_walk_error(&self, error: walkdir::Error) -> ScanError {
        let path = error
            .path()
            .map_or_else(|| self.root.clone(), Path::to_path_buf);

        if let Some(ancestor) = error.loop_ancestor() {
            log::warn!(
                "Symlink loop detected at {} (ancestor {}), skipping",
                path.display(),
                ancestor.display()
            );
            return ScanError::SymlinkLoop {
                ancestor: ancestor.to_path_buf(),
                path,
            };
        }

        match error.into_io_error() {
            Some(io_error) => handle_io_error(path, io_error),
            None => {
                log::warn!("Walker error for {}", path.display());
                ScanError::Io {
                    path,
                    source: std::io::Error::other("directory walk failed"),
                }
            }
        }
    }
}

/// Handle I/O errors during traversal.
fn handle_io_error(path: PathBuf, error: std::io::Error) -> ScanError {
    use std::io::ErrorKind;

    match error.kind() {
        ErrorKind::PermissionDenied => {
            log::warn!("Permission denied, skipping: {}", path.display());
            ScanError::PermissionDenied(path)
        }
        ErrorKind::NotFound => {
            log::warn!("Path not found, skipping: {}", path.display());
            ScanError::NotFound(path)
        }
        _ => {
            log::warn!("Cannot read {}, skipping: {}", path.display(), error);
            ScanError::Io {
                path,
                source: error,
            }
        }
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}
