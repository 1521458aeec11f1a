//! JSON output formatter for remove-duplicates reports.
//!
//! Provides machine-readable JSON output for scripting and automation.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "root": "/home/reader/Books",
//!   "started_at": "2024-05-01T12:00:00Z",
//!   "duration_ms": 1234,
//!   "dry_run": false,
//!   "files_seen": 120,
//!   "registered": 3,
//!   "unchanged": 110,
//!   "repointed": 0,
//!   "skipped_empty": 1,
//!   "removed": [
//!     {
//!       "path": "/home/reader/Books/Dune (1).epub",
//!       "kept": "/home/reader/Books/Dune.epub",
//!       "digest": "9f86d08...",
//!       "size": 1048576
//!     }
//!   ],
//!   "failures": [
//!     { "path": "/home/reader/Books/locked.epub", "action": "hash", "message": "Permission denied: ..." }
//!   ],
//!   "bytes_freed": 1048576,
//!   "exit_code": 0,
//!   "exit_code_name": "ED000"
//! }
//! ```

use std::io::Write;

use serde::Serialize;

use crate::dedupe::DedupeSummary;
use crate::error::ExitCode;

/// Complete JSON output structure.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput<'a> {
    /// The run report
    #[serde(flatten)]
    pub summary: &'a DedupeSummary,
    /// Total bytes of removed duplicates
    pub bytes_freed: u64,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "ED000")
    pub exit_code_name: String,
}

impl<'a> JsonOutput<'a> {
    /// Create a new JSON output from a report and exit code.
    #[must_use]
    pub fn new(summary: &'a DedupeSummary, exit_code: ExitCode) -> Self {
        Self {
            summary,
            bytes_freed: summary.bytes_freed(),
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write JSON to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), JsonOutputError> {
        let json = if pretty {
            self.to_json_pretty()?
        } else {
            self.to_json()?
        };
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}
