//! File removal for duplicate resolution.
//!
//! # Overview
//!
//! Losers of a duplicate pair are removed one at a time:
//! - Permanent deletion (default, matches the unlink semantics users expect
//!   from a dedupe pass)
//! - Move to system trash (recoverable)
//!
//! Every removal verifies the target still exists as a regular file first,
//! so a path that vanished mid-run is reported as [`DeleteError::NotFound`]
//! rather than silently succeeding.
//!
//! # Example
//!
//! ```no_run
//! use ebookdedupe::actions::delete::{remove_file, DeleteMode};
//! use std::path::Path;
//!
//! match remove_file(Path::new("/books/dune (1).epub"), DeleteMode::Trash) {
//!     Ok(result) => println!("Removed: {}", result.path.display()),
//!     Err(e) => eprintln!("Failed: {}", e),
//! }
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for deletion operations.
#[derive(Debug, Error)]
pub enum DeleteError {
    /// File was not found (may have been deleted or moved).
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied when attempting to delete.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// Target exists but is not a regular file.
    #[error("not a regular file: {0}")]
    NotAFile(PathBuf),

    /// Trash operation failed.
    #[error("trash operation failed for {path}: {message}")]
    TrashFailed { path: PathBuf, message: String },

    /// General I/O error.
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl DeleteError {
    /// Get the path associated with this error.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p)
            | Self::PermissionDenied(p)
            | Self::NotAFile(p)
            | Self::TrashFailed { path: p, .. }
            | Self::Io { path: p, .. } => p,
        }
    }

    fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}

/// How a loser file is removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeleteMode {
    /// Unlink the file.
    #[default]
    Permanent,
    /// Move the file to the system trash.
    Trash,
}

impl std::fmt::Display for DeleteMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Permanent => write!(f, "permanent"),
            Self::Trash => write!(f, "trash"),
        }
    }
}

/// Result of a successful removal.
#[derive(Debug, Clone)]
pub struct DeleteResult {
    /// Path that was removed.
    pub path: PathBuf,
    /// Size of the removed file in bytes.
    pub size: u64,
    /// How it was removed.
    pub mode: DeleteMode,
}

/// Remove a single file.
///
/// # Errors
///
/// - `NotFound` if the file doesn't exist
/// - `NotAFile` if the path is a directory or other non-regular entry
/// - `PermissionDenied` if removal is not allowed
/// - `TrashFailed` if the trash operation fails
pub fn remove_file(path: &Path, mode: DeleteMode) -> Result<DeleteResult, DeleteError> {
    let metadata = fs::symlink_metadata(path).map_err(|e| DeleteError::from_io(path, e))?;
    if !metadata.is_file() {
        return Err(DeleteError::NotAFile(path.to_path_buf()));
    }
    let size = metadata.len();

    match mode {
        DeleteMode::Permanent => {
            fs::remove_file(path).map_err(|e| DeleteError::from_io(path, e))?;
            log::info!("Removed: {} ({} bytes)", path.display(), size);
        }
        DeleteMode::Trash => {
            trash::delete(path).map_err(|e| DeleteError::TrashFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
            log::info!("Moved to trash: {} ({} bytes)", path.display(), size);
        }
    }

    Ok(DeleteResult {
        path: path.to_path_buf(),
        size,
        mode,
    })
}
