//! File-name helpers for the rename normalizer.

use std::path::{Path, PathBuf};

/// Characters that cannot appear inside a single path component.
const FORBIDDEN: [char; 3] = ['/', '\\', '\0'];

/// Turn a metadata title into a usable file stem.
///
/// Path separators and NUL become `_`; surrounding whitespace is trimmed.
/// Returns `None` if nothing is left.
#[must_use]
pub fn sanitize_component(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .trim()
        .chars()
        .map(|c| if FORBIDDEN.contains(&c) { '_' } else { c })
        .collect();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// `<dir>/<title>.<ext>`
#[must_use]
pub fn target_path(dir: &Path, title: &str, ext: &str) -> PathBuf {
    dir.join(format!("{title}.{ext}"))
}

/// `<dir>/<title><date>.<ext>`, used when the plain target is taken.
#[must_use]
pub fn dated_target_path(dir: &Path, title: &str, date: &str, ext: &str) -> PathBuf {
    dir.join(format!("{title}{date}.{ext}"))
}

/// Remove every occurrence of `pattern` from `data`.
///
/// An empty pattern leaves `data` unchanged.
///
/// ```
/// use ebookdedupe::rename::strip_substring;
///
/// assert_eq!(strip_substring("Dune (z-lib.org)", " (z-lib.org)"), "Dune");
/// ```
#[must_use]
pub fn strip_substring(data: &str, pattern: &str) -> String {
    if pattern.is_empty() {
        return data.to_string();
    }
    data.replace(pattern, "")
}
