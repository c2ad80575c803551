//! The integrity state machine over an explicit [`Store`].
//!
//! [`IntegrityEngine`] holds no database state of its own. Every operation
//! takes the store it should read or mutate, and none of them persist:
//! saving is the caller's step (see [`Checker`](crate::Checker)), which lets
//! `verify_all` batch a whole run into a single write.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use fic_crypto::{FileHasher, HasherError};
use fic_store::Store;
use fic_types::{IntegrityRecord, Timestamp, DEFAULT_ALGORITHM};
use tracing::{debug, info, warn};

use crate::error::{EngineError, EngineResult};
use crate::outcome::{AddOutcome, Verification, VerifyOutcome};
use crate::path::canonicalize;
use crate::view::RecordView;

/// Captures and re-checks file fingerprints.
///
/// New records are hashed with the engine's default algorithm; existing
/// records are always re-verified with the algorithm stored alongside them,
/// so changing the default never invalidates older records.
#[derive(Clone, Debug)]
pub struct IntegrityEngine {
    hasher: FileHasher,
    default_algorithm: String,
}

impl IntegrityEngine {
    /// Create an engine hashing new records with `default_algorithm`.
    ///
    /// The algorithm name is normalized and must be registered with the
    /// hasher's registry.
    pub fn new(hasher: FileHasher, default_algorithm: &str) -> EngineResult<Self> {
        if !hasher.registry().contains(default_algorithm) {
            return Err(EngineError::UnsupportedAlgorithm(default_algorithm.to_string()));
        }
        Ok(Self {
            default_algorithm: fic_crypto::AlgorithmRegistry::normalize(default_algorithm),
            hasher,
        })
    }

    /// The algorithm used for newly added files.
    pub fn default_algorithm(&self) -> &str {
        &self.default_algorithm
    }

    pub fn hasher(&self) -> &FileHasher {
        &self.hasher
    }

    // ---------------------------------------------------------------
    // Mutations
    // ---------------------------------------------------------------

    /// Fingerprint `path` and store a fresh record for it.
    ///
    /// Any existing record for the same canonical path is overwritten,
    /// resetting its check history.
    pub fn add(&self, store: &mut Store, path: &Path, description: &str) -> EngineResult<AddOutcome> {
        let canonical = canonicalize(path)?;

        let metadata = match fs::metadata(&canonical) {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(EngineError::NotFound(canonical));
            }
            Err(source) => {
                return Err(EngineError::Hash {
                    source: HasherError::Io {
                        path: canonical.clone(),
                        source,
                    },
                    path: canonical,
                });
            }
        };
        if !metadata.is_file() {
            return Err(EngineError::InvalidPath(format!(
                "{} is not a regular file",
                canonical.display()
            )));
        }

        let hash = self
            .hasher
            .digest_file(&canonical, &self.default_algorithm)
            .map_err(|source| EngineError::Hash {
                path: canonical.clone(),
                source,
            })?;

        let record = IntegrityRecord::new(
            hash,
            self.default_algorithm.clone(),
            metadata.len(),
            description,
            Timestamp::now(),
        );
        let replaced = store.insert(canonical.clone(), record.clone()).is_some();
        info!(
            path = %canonical.display(),
            algorithm = %self.default_algorithm,
            size = record.size,
            replaced,
            "added file to integrity database"
        );

        Ok(AddOutcome {
            path: canonical,
            record,
            replaced,
        })
    }

    /// Re-hash `path` and classify it against its stored record.
    ///
    /// Only `verified` and `tampered` outcomes touch the store: both bump
    /// `check_count` and `last_checked_at`, and a mismatch also stamps
    /// `tampered_at`. Errors only if `path` cannot be canonicalized.
    pub fn verify(&self, store: &mut Store, path: &Path) -> EngineResult<Verification> {
        let canonical = canonicalize(path)?;
        Ok(self.verify_canonical(store, &canonical))
    }

    /// Verify every tracked path, in store iteration order.
    pub fn verify_all(&self, store: &mut Store) -> BTreeMap<PathBuf, Verification> {
        let mut results = BTreeMap::new();
        for path in store.paths() {
            let verification = self.verify_canonical(store, &path);
            results.insert(path, verification);
        }
        debug!(files = results.len(), "verified all tracked files");
        results
    }

    /// Drop the record for `path`. Returns whether one existed.
    pub fn remove(&self, store: &mut Store, path: &Path) -> EngineResult<bool> {
        let canonical = canonicalize(path)?;
        let removed = store.remove(&canonical).is_some();
        if removed {
            info!(path = %canonical.display(), "removed file from integrity database");
        } else {
            debug!(path = %canonical.display(), "remove requested for untracked path");
        }
        Ok(removed)
    }

    // ---------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------

    /// Read-only projection of every record.
    pub fn list(&self, store: &Store) -> Vec<RecordView> {
        store
            .iter()
            .map(|(path, record)| RecordView::from_record(path, record))
            .collect()
    }

    fn verify_canonical(&self, store: &mut Store, path: &Path) -> Verification {
        let Some(record) = store.get_mut(path) else {
            debug!(path = %path.display(), "verify requested for untracked path");
            return Verification::new(path, VerifyOutcome::Unknown);
        };

        match path.try_exists() {
            Ok(true) => {}
            Ok(false) => {
                warn!(path = %path.display(), "tracked file is missing");
                return Verification::new(path, VerifyOutcome::Missing);
            }
            Err(e) => {
                return Verification::new(path, VerifyOutcome::Error { reason: e.to_string() });
            }
        }

        let algorithm = if record.algorithm.is_empty() {
            DEFAULT_ALGORITHM
        } else {
            record.algorithm.as_str()
        };
        let current = match self.hasher.digest_file(path, algorithm) {
            Ok(digest) => digest,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not hash tracked file");
                return Verification::new(path, VerifyOutcome::Error { reason: e.to_string() });
            }
        };

        let now = Timestamp::now();
        let outcome = if record.matches(&current) {
            record.mark_verified(now);
            debug!(path = %path.display(), checks = record.check_count, "file verified");
            VerifyOutcome::Verified {
                hash: current,
                last_checked_at: now,
                check_count: record.check_count,
            }
        } else {
            let expected = record.hash.clone();
            record.mark_tampered(now);
            warn!(
                path = %path.display(),
                expected = %expected,
                current = %current,
                "file content does not match recorded hash"
            );
            VerifyOutcome::Tampered {
                expected_hash: expected,
                current_hash: current,
                tampered_at: now,
                check_count: record.check_count,
            }
        };
        Verification::new(path, outcome)
    }
}

impl Default for IntegrityEngine {
    fn default() -> Self {
        Self {
            hasher: FileHasher::default(),
            default_algorithm: DEFAULT_ALGORITHM.to_string(),
        }
    }
}
