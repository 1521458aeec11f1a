//! Duplicate detection and removal.
//!
//! - [`engine`]: the per-file hash / lookup / resolve cycle
//! - [`policy`]: which copy of a duplicate pair survives
//! - [`summary`]: structured run reports

pub mod engine;
pub mod policy;
pub mod summary;

pub use engine::{DedupeEngine, EngineConfig};
pub use policy::{CopyMarkerPolicy, Resolution, Survivor, DEFAULT_COPY_MARKERS};
pub use summary::{DedupeSummary, FileAction, FileFailure, FileOutcome, RemovedFile};
