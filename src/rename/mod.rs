//! Rename normalizer for e-books.
//!
//! Books are renamed to `<title>.<ext>` using the title embedded in their
//! metadata. A companion file with the same stem and the sidecar extension
//! (a `.mobi` next to an `.epub`, by default) is renamed alongside.
//!
//! # Collision handling
//!
//! If `<title>.<ext>` already exists, the publication date is appended
//! (`<title><date>.<ext>`). Without a date, or if the dated name is taken
//! as well, the book is left alone. Existing files are never overwritten.
//!
//! A failed sidecar rename is reported but does not undo the primary rename.
//!
//! # Example
//!
//! ```no_run
//! use ebookdedupe::rename::{RenameOutcome, Renamer};
//! use std::path::Path;
//!
//! let renamer = Renamer::epub();
//! match renamer.rename_file(Path::new("/books/8f2c1.epub")) {
//!     Ok(RenameOutcome::Renamed(book)) => println!("-> {}", book.to.display()),
//!     Ok(RenameOutcome::AlreadyNormalized(_)) => {}
//!     Err(e) => eprintln!("{e}"),
//! }
//! ```

pub mod epub;
pub mod names;

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::dedupe::summary::FileFailure;
use crate::scanner::path_utils::same_file;

pub use epub::EpubMetadata;
pub use names::strip_substring;

/// Metadata fields used for renaming.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookMetadata {
    /// First title, if any
    pub title: Option<String>,
    /// First publication date token, if any
    pub date: Option<String>,
}

/// Source of book metadata.
pub trait MetadataSource {
    /// Read metadata from the book at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`RenameError::Metadata`] if the container cannot be parsed.
    fn read(&self, path: &Path) -> Result<BookMetadata, RenameError>;
}

/// Reasons a book is not renamed.
#[derive(Debug, Error)]
pub enum RenameError {
    /// The file is not a supported book format.
    #[error("unsupported format, only .{expected} files are renamed: {path}")]
    UnsupportedExtension { path: PathBuf, expected: String },

    /// The container or its metadata could not be read.
    #[error("cannot read metadata from {path}: {message}")]
    Metadata { path: PathBuf, message: String },

    /// The metadata carries no usable title.
    #[error("no title in metadata: {0}")]
    MissingTitle(PathBuf),

    /// The target name is taken and no date is available to disambiguate.
    #[error("{target} already exists, not renaming {path}")]
    TargetExists { path: PathBuf, target: PathBuf },

    /// The rename itself failed.
    #[error("rename {path} -> {target} failed: {source}")]
    Io {
        path: PathBuf,
        target: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl RenameError {
    /// Build a [`RenameError::Metadata`] from any displayable cause.
    #[must_use]
    pub fn metadata(path: &Path, error: &dyn fmt::Display) -> Self {
        Self::Metadata {
            path: path.to_path_buf(),
            message: error.to_string(),
        }
    }

    /// Path of the book this error concerns.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::UnsupportedExtension { path, .. }
            | Self::Metadata { path, .. }
            | Self::TargetExists { path, .. }
            | Self::Io { path, .. } => path,
            Self::MissingTitle(path) => path,
        }
    }

    /// Whether this is a metadata (parse) problem rather than a file-system one.
    #[must_use]
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Self::Metadata { .. } | Self::MissingTitle(_))
    }
}

/// Result of the sidecar half of a rename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SidecarOutcome {
    /// The companion file was renamed.
    Renamed { from: PathBuf, to: PathBuf },
    /// The companion file exists but could not be renamed.
    Failed { path: PathBuf, message: String },
}

/// A completed book rename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenamedBook {
    /// Old path
    pub from: PathBuf,
    /// New path
    pub to: PathBuf,
    /// Companion file result, if a companion exists
    pub sidecar: Option<SidecarOutcome>,
}

/// Result of normalizing one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameOutcome {
    /// The file already has its canonical name.
    AlreadyNormalized(PathBuf),
    /// The file was renamed.
    Renamed(RenamedBook),
}

/// Report of a rename run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RenameSummary {
    /// Completed renames
    pub renamed: Vec<RenamedBook>,
    /// Books already carrying their canonical name
    pub unchanged: usize,
    /// Files skipped because of their format
    pub skipped: Vec<PathBuf>,
    /// Isolated per-file failures
    pub failures: Vec<FileFailure>,
}

/// Metadata-driven book renamer.
pub struct Renamer {
    source: Box<dyn MetadataSource>,
    book_extension: String,
    sidecar_extension: String,
}

impl fmt::Debug for Renamer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renamer")
            .field("book_extension", &self.book_extension)
            .field("sidecar_extension", &self.sidecar_extension)
            .finish_non_exhaustive()
    }
}

impl Renamer {
    /// Create a renamer with a custom metadata source.
    ///
    /// Extensions are given without the leading dot.
    #[must_use]
    pub fn new(
        source: Box<dyn MetadataSource>,
        book_extension: impl Into<String>,
        sidecar_extension: impl Into<String>,
    ) -> Self {
        Self {
            source,
            book_extension: book_extension.into().trim_start_matches('.').to_string(),
            sidecar_extension: sidecar_extension.into().trim_start_matches('.').to_string(),
        }
    }

    /// EPUB renamer with `.mobi` companions.
    #[must_use]
    pub fn epub() -> Self {
        Self::new(Box::new(EpubMetadata), "epub", "mobi")
    }

    /// Extension of the files this renamer handles.
    #[must_use]
    pub fn book_extension(&self) -> &str {
        &self.book_extension
    }

    /// Whether `path` has the supported book extension (case-insensitive).
    #[must_use]
    pub fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(&self.book_extension))
    }

    /// Normalize the name of one book.
    ///
    /// # Errors
    ///
    /// Returns [`RenameError`] when the file is skipped or the rename fails.
    /// Sidecar problems are reported inside the returned [`RenamedBook`].
    pub fn rename_file(&self, path: &Path) -> Result<RenameOutcome, RenameError> {
        if !self.is_supported(path) {
            return Err(RenameError::UnsupportedExtension {
                path: path.to_path_buf(),
                expected: self.book_extension.clone(),
            });
        }
        // Keep the extension exactly as found on disk
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.book_extension.clone());
        let dir = path.parent().unwrap_or_else(|| Path::new(""));

        let metadata = self.source.read(path)?;
        let title = metadata
            .title
            .as_deref()
            .and_then(names::sanitize_component)
            .ok_or_else(|| RenameError::MissingTitle(path.to_path_buf()))?;

        let mut target = names::target_path(dir, &title, &ext);
        if target == path {
            return Ok(RenameOutcome::AlreadyNormalized(path.to_path_buf()));
        }

        if is_taken(&target, path) {
            log::info!("{} already exists", target.display());
            let date = metadata
                .date
                .as_deref()
                .and_then(names::sanitize_component)
                .ok_or_else(|| RenameError::TargetExists {
                    path: path.to_path_buf(),
                    target: target.clone(),
                })?;
            target = names::dated_target_path(dir, &title, &date, &ext);
            if target == path {
                return Ok(RenameOutcome::AlreadyNormalized(path.to_path_buf()));
            }
            if is_taken(&target, path) {
                return Err(RenameError::TargetExists {
                    path: path.to_path_buf(),
                    target,
                });
            }
        }

        fs::rename(path, &target).map_err(|source| RenameError::Io {
            path: path.to_path_buf(),
            target: target.clone(),
            source,
        })?;
        log::info!("Renamed {} to {}", path.display(), target.display());

        let sidecar = self.rename_sidecar(path, &target);
        Ok(RenameOutcome::Renamed(RenamedBook {
            from: path.to_path_buf(),
            to: target,
            sidecar,
        }))
    }

    /// Rename `<old stem>.<sidecar>` to `<new stem>.<sidecar>` if it exists.
    fn rename_sidecar(&self, old_book: &Path, new_book: &Path) -> Option<SidecarOutcome> {
        let from = old_book.with_extension(&self.sidecar_extension);
        if !from.is_file() {
            return None;
        }
        let to = new_book.with_extension(&self.sidecar_extension);

        if is_taken(&to, &from) {
            let message = format!("{} already exists", to.display());
            log::warn!("Sidecar rename skipped for {}: {}", from.display(), message);
            return Some(SidecarOutcome::Failed {
                path: from,
                message,
            });
        }

        match fs::rename(&from, &to) {
            Ok(()) => {
                log::info!("Renamed {} to {}", from.display(), to.display());
                Some(SidecarOutcome::Renamed { from, to })
            }
            Err(e) => {
                log::warn!("Sidecar rename failed for {}: {}", from.display(), e);
                Some(SidecarOutcome::Failed {
                    path: from,
                    message: e.to_string(),
                })
            }
        }
    }
}

/// Whether `target` is occupied by a file other than `source`.
fn is_taken(target: &Path, source: &Path) -> bool {
    target.symlink_metadata().is_ok() && !same_file(target, source)
}
