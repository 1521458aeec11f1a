//! File actions module.
//!
//! Removal of duplicate copies, either permanently or via the system trash.
//!
//! ```no_run
//! use ebookdedupe::actions::{remove_file, DeleteMode};
//! use std::path::Path;
//!
//! let result = remove_file(Path::new("/books/copy.epub"), DeleteMode::Permanent);
//! ```

pub mod delete;

// Re-export commonly used types
pub use delete::{remove_file, DeleteError, DeleteMode, DeleteResult};
