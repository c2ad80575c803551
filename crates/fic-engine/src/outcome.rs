//! Results of engine operations.
//!
//! A [`Verification`] pairs the file path with a [`VerifyOutcome`] that
//! carries whatever details the classification has (current hash, expected
//! vs. current hash, failure reason).

use std::fmt;
use std::path::{Path, PathBuf};

use fic_types::{IntegrityRecord, Timestamp};
use serde::Serialize;

/// Result of adding a file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddOutcome {
    /// Canonical path the record is stored under.
    pub path: PathBuf,
    /// The freshly captured record.
    pub record: IntegrityRecord,
    /// Whether an existing record for the same path was overwritten.
    pub replaced: bool,
}

/// Classification of one verification attempt, with its details.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum VerifyOutcome {
    /// The current digest matches the stored hash.
    Verified {
        hash: String,
        last_checked_at: Timestamp,
        check_count: u64,
    },
    /// The current digest differs from the stored hash.
    Tampered {
        expected_hash: String,
        current_hash: String,
        tampered_at: Timestamp,
        check_count: u64,
    },
    /// The path is tracked but the file is gone.
    Missing,
    /// The path is not tracked.
    Unknown,
    /// The file exists but could not be hashed.
    Error { reason: String },
}

/// Plain status tag, for counting and display.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VerifyStatus {
    Verified,
    Tampered,
    Missing,
    Unknown,
    Error,
}

impl VerifyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Verified => "verified",
            Self::Tampered => "tampered",
            Self::Missing => "missing",
            Self::Unknown => "unknown",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for VerifyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verification result for one path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Verification {
    pub path: PathBuf,
    #[serde(flatten)]
    pub outcome: VerifyOutcome,
}

impl Verification {
    pub fn new(path: &Path, outcome: VerifyOutcome) -> Self {
        Self {
            path: path.to_path_buf(),
            outcome,
        }
    }

    pub fn status(&self) -> VerifyStatus {
        match self.outcome {
            VerifyOutcome::Verified { .. } => VerifyStatus::Verified,
            VerifyOutcome::Tampered { .. } => VerifyStatus::Tampered,
            VerifyOutcome::Missing => VerifyStatus::Missing,
            VerifyOutcome::Unknown => VerifyStatus::Unknown,
            VerifyOutcome::Error { .. } => VerifyStatus::Error,
        }
    }

    /// Human-readable summary of the outcome.
    pub fn message(&self) -> String {
        match &self.outcome {
            VerifyOutcome::Verified { .. } => "File integrity verified".to_string(),
            VerifyOutcome::Tampered { .. } => "File has been modified".to_string(),
            VerifyOutcome::Missing => "File no longer exists".to_string(),
            VerifyOutcome::Unknown => "File not in database".to_string(),
            VerifyOutcome::Error { reason } => {
                format!("Could not calculate current hash: {reason}")
            }
        }
    }

    /// Returns `true` if this verification changed the stored record.
    ///
    /// Only outcomes that computed a current digest touch the store.
    pub fn mutated_store(&self) -> bool {
        matches!(
            self.outcome,
            VerifyOutcome::Verified { .. } | VerifyOutcome::Tampered { .. }
        )
    }

    pub fn is_verified(&self) -> bool {
        self.status() == VerifyStatus::Verified
    }
}

/// Aggregate counts over a batch of verifications.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct VerifySummary {
    pub verified: usize,
    pub tampered: usize,
    /// Missing, unknown and errored files.
    pub other: usize,
}

impl VerifySummary {
    pub fn tally<'a>(results: impl IntoIterator<Item = &'a Verification>) -> Self {
        let mut summary = Self::default();
        for v in results {
            match v.status() {
                VerifyStatus::Verified => summary.verified += 1,
                VerifyStatus::Tampered => summary.tampered += 1,
                _ => summary.other += 1,
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.verified + self.tampered + self.other
    }

    /// Returns `true` if every file verified.
    pub fn is_clean(&self) -> bool {
        self.tampered == 0 && self.other == 0
    }
}
