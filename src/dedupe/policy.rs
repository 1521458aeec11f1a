//! Survivor selection for duplicate pairs.
//!
//! When two files share a digest, exactly one is kept. The decision uses
//! only the file name of the already-indexed copy: if it carries a copy
//! marker (such as `(1)` or `副本`), it is treated as the less original
//! copy and removed in favour of the newly discovered file. In every other
//! case the newly discovered file is removed.
//!
//! Modification times, path depth and sizes play no part in the decision.

use std::path::Path;

use crate::scanner::path_utils::file_name_str;

/// Markers used when none are configured.
pub const DEFAULT_COPY_MARKERS: [&str; 2] = ["(1)", "副本"];

/// Which side of a duplicate pair is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Survivor {
    /// Keep the indexed copy, remove the newly discovered file.
    Existing,
    /// Keep the newly discovered file, remove the indexed copy.
    Current,
}

/// Outcome of applying the policy to a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution<'a> {
    /// Which side survives
    pub survivor: Survivor,
    /// Path to keep
    pub keep: &'a Path,
    /// Path to remove
    pub remove: &'a Path,
}

/// Copy-marker tie-break policy.
#[derive(Debug, Clone)]
pub struct CopyMarkerPolicy {
    markers: Vec<String>,
}

impl Default for CopyMarkerPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_COPY_MARKERS.iter().map(ToString::to_string))
    }
}

impl CopyMarkerPolicy {
    /// Create a policy from a list of markers.
    ///
    /// Empty markers are dropped; they would match every file name.
    #[must_use]
    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let markers = markers
            .into_iter()
            .map(Into::into)
            .filter(|m: &String| !m.is_empty())
            .collect();
        Self { markers }
    }

    /// Configured markers.
    #[must_use]
    pub fn markers(&self) -> &[String] {
        &self.markers
    }

    /// Whether the file name of `path` contains any copy marker.
    #[must_use]
    pub fn has_marker(&self, path: &Path) -> bool {
        let name = file_name_str(path);
        self.markers.iter().any(|marker| name.contains(marker.as_str()))
    }

    /// Decide which of two same-content files to keep.
    #[must_use]
    pub fn resolve<'a>(&self, existing: &'a Path, current: &'a Path) -> Resolution<'a> {
        if self.has_marker(existing) {
            Resolution {
                survivor: Survivor::Current,
                keep: current,
                remove: existing,
            }
        } else {
            Resolution {
                survivor: Survivor::Existing,
                keep: existing,
                remove: current,
            }
        }
    }
}
