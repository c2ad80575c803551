//! Read-only record projection for listing.

use std::path::{Path, PathBuf};

use fic_types::{IntegrityRecord, RecordState, Timestamp};
use serde::Serialize;

/// One tracked file as shown by `list`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RecordView {
    pub path: PathBuf,
    pub hash: String,
    pub algorithm: String,
    pub size: u64,
    pub added_at: Timestamp,
    /// `None` if the file was never checked after being added.
    pub last_checked_at: Option<Timestamp>,
    pub tampered_at: Option<Timestamp>,
    /// Persisted status, or `Unknown` when none was recorded.
    pub status: RecordState,
    pub description: String,
    pub check_count: u64,
}

impl RecordView {
    pub fn from_record(path: &Path, record: &IntegrityRecord) -> Self {
        Self {
            path: path.to_path_buf(),
            hash: record.hash.clone(),
            algorithm: record.algorithm.clone(),
            size: record.size,
            added_at: record.added_at,
            last_checked_at: record.last_checked_at,
            tampered_at: record.tampered_at,
            status: record.state(),
            description: record.description.clone(),
            check_count: record.check_count,
        }
    }
}
