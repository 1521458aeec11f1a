//! Unicode path normalization utilities.
//!
//! macOS stores file names in NFD (decomposed) form while Linux and Windows
//! usually hold NFC (composed) names, so the same visible title can have two
//! byte representations. Name search goes through [`search_key`] so both
//! forms match the same query.
//!
//! # Example
//!
//! ```
//! use ebookdedupe::scanner::path_utils::{normalize_path_str, search_key};
//! use std::path::Path;
//!
//! let nfc = "café.epub";           // é is U+00E9
//! let nfd = "cafe\u{0301}.epub";   // e + combining accent
//!
//! assert_eq!(normalize_path_str(nfc), normalize_path_str(nfd));
//! assert_eq!(search_key(Path::new("/Books/CAFÉ.epub")), "/books/café.epub");
//! ```

use std::path::Path;

use unicode_normalization::UnicodeNormalization;

/// Normalize a string to NFC (composed) form.
#[must_use]
pub fn normalize_path_str(s: &str) -> String {
    s.nfc().collect()
}

/// Lowercased NFC form of a path, used for case-insensitive name search.
#[must_use]
pub fn search_key(path: &Path) -> String {
    normalize_query(&path.to_string_lossy())
}

/// Lowercased NFC form of a free-text query.
#[must_use]
pub fn normalize_query(query: &str) -> String {
    normalize_path_str(query).to_lowercase()
}

/// File name component of a path as a string, or empty if there is none.
#[must_use]
pub fn file_name_str(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Canonical string form used for the `path` column of the index.
#[must_use]
pub fn path_to_record(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Check whether two paths name the same file on disk.
///
/// Textually equal paths are the same file even if they no longer exist.
/// Otherwise both are canonicalized; if either cannot be resolved they are
/// treated as different.
#[must_use]
pub fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(ca), Ok(cb)) => ca == cb,
        _ => false,
    }
}
