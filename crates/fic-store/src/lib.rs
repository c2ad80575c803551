//! Persistence for fic integrity records.
//!
//! The whole database is a single [`Store`] document: a path-keyed map of
//! [`IntegrityRecord`](fic_types::IntegrityRecord)s plus creation/update
//! metadata. Callers load it, mutate it in memory, and save it back
//! explicitly; there is no caching between invocations and no cross-process
//! locking.
//!
//! # Storage Backends
//!
//! All backends implement the [`StoreBackend`] trait:
//!
//! - [`JsonFileBackend`] -- the on-disk JSON database
//! - [`InMemoryBackend`] -- a lock-guarded store for tests and embedding
//!
//! # Design Rules
//!
//! 1. Loading never fails: a missing database starts empty, a corrupt one is
//!    logged and replaced by an empty store.
//! 2. Saves are atomic: content goes to a sibling temp file that is renamed
//!    over the target, so a failed save leaves the previous file intact.
//! 3. Imports parse the source completely before touching the in-memory
//!    store; a malformed source changes nothing.
//! 4. All other I/O errors are propagated, never silently ignored.

pub mod error;
pub mod json;
pub mod memory;
pub mod store;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use error::{StoreError, StoreResult};
pub use json::{export_store, import_store, read_store_file, write_store_file, JsonFileBackend};
pub use memory::InMemoryBackend;
pub use store::{ImportMode, ImportSummary, Store, StoreMetadata};
pub use traits::StoreBackend;
