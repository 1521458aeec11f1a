//! Content index for ebookdedupe.
//!
//! The index maps a content digest to the one path currently recorded for
//! it. It exists in two forms:
//!
//! * [`entry`]: the [`IndexedFile`] record and the in-memory [`Index`], which
//!   enforces at most one path per digest and at most one digest per path.
//! * [`database`]: the durable [`IndexStore`] seam and its SQLite-backed
//!   implementation, [`SqliteIndexStore`].
//!
//! # Lifecycle
//!
//! The durable store is the source of truth across runs. At startup every
//! record is loaded into a fresh [`Index`]; during a run the engine mutates
//! the in-memory index first and then asks the store to persist the change.
//! A failed store write is reported but leaves the in-memory index intact,
//! so duplicate detection within the same run keeps working.

pub mod database;
pub mod entry;

pub use database::{IndexStore, SqliteIndexStore, StoreError, StoreResult};
pub use entry::{Index, IndexedFile};
