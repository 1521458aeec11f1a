//! Output formatters for run reports.
//!
//! - Text for people reading a terminal
//! - JSON for automation and scripting
//!
//! # Example
//!
//! ```no_run
//! use ebookdedupe::dedupe::{DedupeEngine, EngineConfig};
//! use ebookdedupe::error::ExitCode;
//! use ebookdedupe::index::SqliteIndexStore;
//! use ebookdedupe::output::JsonOutput;
//! use std::path::Path;
//!
//! let store = SqliteIndexStore::open_in_memory().unwrap();
//! let mut engine = DedupeEngine::open(store, EngineConfig::default()).unwrap();
//! let summary = engine.remove_duplicates(Path::new("."));
//!
//! let output = JsonOutput::new(&summary, ExitCode::Success);
//! println!("{}", output.to_json_pretty().unwrap());
//! ```

pub mod json;
pub mod text;

// Re-export main types
pub use json::{JsonOutput, JsonOutputError};
pub use text::{write_dedupe_summary, write_rename_summary};
