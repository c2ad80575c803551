//! Integrity records: the fingerprint captured for each tracked file.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::timestamp::Timestamp;

/// Algorithm assumed for records that predate the `algorithm` field.
pub const DEFAULT_ALGORITHM: &str = "sha256";

fn default_algorithm() -> String {
    DEFAULT_ALGORITHM.to_string()
}

/// Fingerprint of one tracked file.
///
/// Serialized field names match the on-disk database format (`added_date`,
/// `last_checked`, `tampered_date`). Fields other than `hash`, `size` and
/// `added_date` are optional on read so older databases still load.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityRecord {
    /// Hex digest of the file content at capture time.
    pub hash: String,
    /// Name of the algorithm that produced `hash`.
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
    /// File size in bytes at capture time.
    pub size: u64,
    /// When the record was created.
    #[serde(rename = "added_date")]
    pub added_at: Timestamp,
    /// When the file was last successfully re-hashed.
    #[serde(rename = "last_checked", default, skip_serializing_if = "Option::is_none")]
    pub last_checked_at: Option<Timestamp>,
    /// Free-form note supplied when the file was added.
    #[serde(default)]
    pub description: String,
    /// Number of successful hash computations, including the initial one.
    #[serde(default)]
    pub check_count: u64,
    /// Outcome of the most recent verification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<RecordStatus>,
    /// When a mismatch was last detected.
    ///
    /// This is a historical marker: it survives a later successful
    /// verification and is never cleared.
    #[serde(rename = "tampered_date", default, skip_serializing_if = "Option::is_none")]
    pub tampered_at: Option<Timestamp>,
}

impl IntegrityRecord {
    /// Create a freshly captured record: verified, checked once at `now`.
    pub fn new(
        hash: impl Into<String>,
        algorithm: impl Into<String>,
        size: u64,
        description: impl Into<String>,
        now: Timestamp,
    ) -> Self {
        Self {
            hash: hash.into(),
            algorithm: algorithm.into(),
            size,
            added_at: now,
            last_checked_at: Some(now),
            description: description.into(),
            check_count: 1,
            status: Some(RecordStatus::Verified),
            tampered_at: None,
        }
    }

    /// Returns `true` if `digest` equals the stored hash.
    ///
    /// Hex case is ignored so hand-edited databases still compare equal.
    pub fn matches(&self, digest: &str) -> bool {
        self.hash.eq_ignore_ascii_case(digest)
    }

    /// Record a verification whose digest matched.
    pub fn mark_verified(&mut self, now: Timestamp) {
        self.check_count += 1;
        self.last_checked_at = Some(now);
        self.status = Some(RecordStatus::Verified);
    }

    /// Record a verification whose digest differed from the stored hash.
    pub fn mark_tampered(&mut self, now: Timestamp) {
        self.check_count += 1;
        self.last_checked_at = Some(now);
        self.status = Some(RecordStatus::Tampered);
        self.tampered_at = Some(now);
    }

    /// The status as seen by readers, `Unknown` when none was persisted.
    pub fn state(&self) -> RecordState {
        match self.status {
            Some(RecordStatus::Verified) => RecordState::Verified,
            Some(RecordStatus::Tampered) => RecordState::Tampered,
            None => RecordState::Unknown,
        }
    }
}

/// Persisted verification outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Verified,
    Tampered,
}

/// Read-time status of a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordState {
    Verified,
    Tampered,
    Unknown,
}

impl RecordState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Verified => "verified",
            Self::Tampered => "tampered",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RecordState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    fn sample() -> IntegrityRecord {
        IntegrityRecord::new("abc123", "sha256", 5, "config", ts("2024-01-01T00:00:00Z"))
    }

    #[test]
    fn new_record_is_verified_once() {
        let rec = sample();
        assert_eq!(rec.check_count, 1);
        assert_eq!(rec.status, Some(RecordStatus::Verified));
        assert_eq!(rec.last_checked_at, Some(rec.added_at));
        assert!(rec.tampered_at.is_none());
    }

    #[test]
    fn match_ignores_hex_case() {
        let rec = sample();
        assert!(rec.matches("ABC123"));
        assert!(!rec.matches("abc124"));
    }

    #[test]
    fn tampered_marker_survives_reverification() {
        let mut rec = sample();
        let t1 = ts("2024-01-02T00:00:00Z");
        let t2 = ts("2024-01-03T00:00:00Z");

        rec.mark_tampered(t1);
        assert_eq!(rec.state(), RecordState::Tampered);
        assert_eq!(rec.tampered_at, Some(t1));

        rec.mark_verified(t2);
        assert_eq!(rec.state(), RecordState::Verified);
        assert_eq!(rec.tampered_at, Some(t1));
        assert_eq!(rec.last_checked_at, Some(t2));
        assert_eq!(rec.check_count, 3);
    }

    #[test]
    fn serializes_with_database_field_names() {
        let value = serde_json::to_value(sample()).unwrap();
        let obj = value.as_object().unwrap();
        assert!(obj.contains_key("added_date"));
        assert!(obj.contains_key("last_checked"));
        assert_eq!(obj["status"], "verified");
        assert!(!obj.contains_key("tampered_date"));
    }

    #[test]
    fn legacy_record_without_optional_fields() {
        let json = r#"{
            "hash": "deadbeef",
            "size": 12,
            "added_date": "2023-06-01T08:15:30.250000"
        }"#;
        let rec: IntegrityRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.algorithm, DEFAULT_ALGORITHM);
        assert_eq!(rec.check_count, 0);
        assert!(rec.description.is_empty());
        assert!(rec.last_checked_at.is_none());
        assert_eq!(rec.state(), RecordState::Unknown);
    }

    #[test]
    fn status_strings() {
        let parsed: RecordStatus = serde_json::from_str("\"tampered\"").unwrap();
        assert_eq!(parsed, RecordStatus::Tampered);
        assert_eq!(RecordState::Unknown.to_string(), "unknown");
    }
}
