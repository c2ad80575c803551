//! The in-memory database document.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use fic_types::{IntegrityRecord, Timestamp};
use serde::{Deserialize, Serialize};

/// The full persisted state: every tracked file plus store metadata.
///
/// Records are keyed by canonical absolute path. The `BTreeMap` gives a
/// stable, sorted iteration order, but callers should not treat ordering as
/// part of the contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Store {
    #[serde(default)]
    pub files: BTreeMap<PathBuf, IntegrityRecord>,
    #[serde(default)]
    pub metadata: StoreMetadata,
}

/// Store-level bookkeeping.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreMetadata {
    /// When this store was first created.
    #[serde(rename = "created", default = "Timestamp::now")]
    pub created_at: Timestamp,
    /// When this store was last saved.
    #[serde(rename = "last_updated", default, skip_serializing_if = "Option::is_none")]
    pub last_updated_at: Option<Timestamp>,
}

impl Default for StoreMetadata {
    fn default() -> Self {
        Self {
            created_at: Timestamp::now(),
            last_updated_at: None,
        }
    }
}

/// How an imported store combines with the current one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImportMode {
    /// Replace the current store wholesale, metadata included.
    Replace,
    /// Merge records key by key; imported records win on collision and the
    /// current metadata is kept.
    Merge,
}

/// What an import changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    /// Records present in the imported file.
    pub records_read: usize,
    /// Imported paths that were not tracked before.
    pub added: usize,
    /// Imported paths that replaced an existing record.
    pub overwritten: usize,
    /// Previously tracked paths dropped by a replacing import.
    pub removed: usize,
}

impl Store {
    /// A fresh empty store created now.
    pub fn new() -> Self {
        Self {
            files: BTreeMap::new(),
            metadata: StoreMetadata::default(),
        }
    }

    /// Number of tracked files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns `true` if no files are tracked.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn get(&self, path: &Path) -> Option<&IntegrityRecord> {
        self.files.get(path)
    }

    pub fn get_mut(&mut self, path: &Path) -> Option<&mut IntegrityRecord> {
        self.files.get_mut(path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    /// Insert or overwrite the record for `path`, returning the old one.
    pub fn insert(&mut self, path: PathBuf, record: IntegrityRecord) -> Option<IntegrityRecord> {
        self.files.insert(path, record)
    }

    /// Remove the record for `path`, if any.
    pub fn remove(&mut self, path: &Path) -> Option<IntegrityRecord> {
        self.files.remove(path)
    }

    /// Tracked paths in iteration order.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PathBuf, &IntegrityRecord)> {
        self.files.iter()
    }

    /// Stamp the store as updated at `now`.
    pub fn touch(&mut self, now: Timestamp) {
        self.metadata.last_updated_at = Some(now);
    }

    /// Fold an already-parsed store into this one.
    pub fn apply_import(&mut self, imported: Store, mode: ImportMode) -> ImportSummary {
        let mut summary = ImportSummary {
            records_read: imported.files.len(),
            ..Default::default()
        };
        for path in imported.files.keys() {
            if self.files.contains_key(path) {
                summary.overwritten += 1;
            } else {
                summary.added += 1;
            }
        }

        match mode {
            ImportMode::Merge => {
                self.files.extend(imported.files);
            }
            ImportMode::Replace => {
                summary.removed = self
                    .files
                    .keys()
                    .filter(|path| !imported.files.contains_key(*path))
                    .count();
                *self = imported;
            }
        }
        summary
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}
