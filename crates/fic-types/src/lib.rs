//! Foundation types for fic, the file integrity checker.
//!
//! This crate provides the data model shared by every other fic crate: the
//! per-file [`IntegrityRecord`] and the timestamps it carries.
//!
//! # Key Types
//!
//! - [`IntegrityRecord`] -- Fingerprint of one tracked file (hash, size, check history)
//! - [`RecordStatus`] -- Persisted outcome of the most recent verification
//! - [`RecordState`] -- Read-time status, with `Unknown` for legacy records
//! - [`Timestamp`] -- UTC wall-clock instant with lenient ISO 8601 parsing

pub mod error;
pub mod record;
pub mod timestamp;

pub use error::TypeError;
pub use record::{IntegrityRecord, RecordState, RecordStatus, DEFAULT_ALGORITHM};
pub use timestamp::Timestamp;
