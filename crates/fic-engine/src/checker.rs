//! Load-mutate-save sessions over a store backend.
//!
//! Each [`Checker`] call loads the store fresh, runs one engine operation and
//! saves only if the operation changed something. Nothing is cached between
//! calls and nothing is locked: two processes racing on the same database can
//! lose an update.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use fic_store::{export_store, import_store, ImportMode, ImportSummary, JsonFileBackend, Store, StoreBackend};

use crate::config::CheckerConfig;
use crate::engine::IntegrityEngine;
use crate::error::{EngineError, EngineResult};
use crate::outcome::{AddOutcome, Verification};
use crate::view::RecordView;

/// A verification result together with the outcome of writing it back.
///
/// A failed save does not undo the classification: `value` always holds what
/// the files look like now, and `persist_error` says whether the updated
/// history made it to the backend.
#[derive(Debug)]
pub struct Checked<T> {
    pub value: T,
    pub persist_error: Option<EngineError>,
}

impl<T> Checked<T> {
    fn unchanged(value: T) -> Self {
        Self { value, persist_error: None }
    }

    /// Fail with the save error, if any, discarding `value`.
    pub fn into_result(self) -> EngineResult<T> {
        match self.persist_error {
            Some(e) => Err(e),
            None => Ok(self.value),
        }
    }
}

/// An [`IntegrityEngine`] bound to the backend that persists its store.
#[derive(Debug)]
pub struct Checker<B: StoreBackend = JsonFileBackend> {
    engine: IntegrityEngine,
    backend: B,
}

impl Checker<JsonFileBackend> {
    /// A checker over the JSON database named by `config`.
    pub fn from_config(config: &CheckerConfig) -> EngineResult<Self> {
        let engine = config.build_engine()?;
        Ok(Self::new(engine, JsonFileBackend::new(&config.store_path)))
    }
}

impl<B: StoreBackend> Checker<B> {
    pub fn new(engine: IntegrityEngine, backend: B) -> Self {
        Self { engine, backend }
    }

    pub fn engine(&self) -> &IntegrityEngine {
        &self.engine
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Fingerprint `path` and persist the new record.
    pub fn add(&self, path: &Path, description: &str) -> EngineResult<AddOutcome> {
        let mut store = self.backend.load();
        let outcome = self.engine.add(&mut store, path, description)?;
        self.persist(&mut store)?;
        Ok(outcome)
    }

    /// Verify one file, persisting the updated record if it was re-hashed.
    ///
    /// Errors only if `path` cannot be canonicalized. A save failure is
    /// reported alongside the classification.
    pub fn verify(&self, path: &Path) -> EngineResult<Checked<Verification>> {
        let mut store = self.backend.load();
        let verification = self.engine.verify(&mut store, path)?;
        if !verification.mutated_store() {
            return Ok(Checked::unchanged(verification));
        }
        Ok(Checked {
            persist_error: self.persist(&mut store).err(),
            value: verification,
        })
    }

    /// Verify every tracked file with a single save at the end.
    pub fn verify_all(&self) -> Checked<BTreeMap<PathBuf, Verification>> {
        let mut store = self.backend.load();
        let results = self.engine.verify_all(&mut store);
        if !results.values().any(Verification::mutated_store) {
            return Checked::unchanged(results);
        }
        Checked {
            persist_error: self.persist(&mut store).err(),
            value: results,
        }
    }

    /// Drop the record for `path`; returns whether one existed.
    pub fn remove(&self, path: &Path) -> EngineResult<bool> {
        let mut store = self.backend.load();
        let removed = self.engine.remove(&mut store, path)?;
        if removed {
            self.persist(&mut store)?;
        }
        Ok(removed)
    }

    /// Every record, for display.
    pub fn list(&self) -> Vec<RecordView> {
        self.engine.list(&self.backend.load())
    }

    /// Copy the current database verbatim to `dest`.
    pub fn export(&self, dest: &Path) -> EngineResult<usize> {
        let store = self.backend.load();
        export_store(&store, dest)?;
        Ok(store.len())
    }

    /// Replace or merge the database with the one at `source`.
    ///
    /// A source that cannot be read or parsed changes nothing.
    pub fn import(&self, source: &Path, mode: ImportMode) -> EngineResult<ImportSummary> {
        let mut store = self.backend.load();
        let summary = import_store(&mut store, source, mode)?;
        self.persist(&mut store)?;
        Ok(summary)
    }

    /// The current store as loaded from the backend.
    pub fn snapshot(&self) -> Store {
        self.backend.load()
    }

    fn persist(&self, store: &mut Store) -> EngineResult<()> {
        self.backend
            .save(store)
            .map_err(|source| EngineError::Persist {
                location: self.backend.location(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::VerifyStatus;
    use fic_store::InMemoryBackend;
    use std::fs;

    fn memory_checker() -> Checker<InMemoryBackend> {
        Checker::new(IntegrityEngine::default(), InMemoryBackend::new())
    }

    #[test]
    fn add_persists() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, "hello").unwrap();
        let checker = memory_checker();

        let outcome = checker.add(&file, "").unwrap();
        assert_eq!(checker.backend().save_count(), 1);
        assert!(checker.snapshot().contains(&outcome.path));
    }

    #[test]
    fn add_reports_persist_failure() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, "hello").unwrap();
        let checker = memory_checker();
        checker.backend().set_read_only(true);

        let err = checker.add(&file, "").unwrap_err();
        assert!(matches!(err, EngineError::Persist { .. }));
        assert!(checker.snapshot().is_empty());
    }

    #[test]
    fn non_mutating_outcomes_do_not_save() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, "hello").unwrap();
        let checker = memory_checker();

        let v = checker.verify(&file).unwrap();
        assert_eq!(v.value.status(), VerifyStatus::Unknown);
        assert!(v.persist_error.is_none());
        assert!(!checker.remove(&file).unwrap());
        assert_eq!(checker.backend().save_count(), 0);

        checker.add(&file, "").unwrap();
        fs::remove_file(&file).unwrap();
        assert_eq!(checker.verify(&file).unwrap().value.status(), VerifyStatus::Missing);
        assert_eq!(checker.backend().save_count(), 1);
    }

    #[test]
    fn verify_all_saves_once() {
        let dir = tempfile::tempdir().unwrap();
        let checker = memory_checker();
        for name in ["a", "b", "c"] {
            let file = dir.path().join(name);
            fs::write(&file, name).unwrap();
            checker.add(&file, "").unwrap();
        }

        let results = checker.verify_all().into_result().unwrap();
        assert_eq!(results.len(), 3);
        assert!(results.values().all(Verification::is_verified));
        assert_eq!(checker.backend().save_count(), 4);
        assert!(checker.snapshot().iter().all(|(_, r)| r.check_count == 2));
    }

    #[test]
    fn verify_reports_persist_failure() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, "hello").unwrap();
        let checker = memory_checker();
        let path = checker.add(&file, "").unwrap().path;
        checker.backend().set_read_only(true);

        let checked = checker.verify(&file).unwrap();
        assert!(checked.value.is_verified());
        assert!(matches!(checked.persist_error, Some(EngineError::Persist { .. })));
        assert_eq!(checker.snapshot().get(&path).unwrap().check_count, 1);
    }

    #[test]
    fn tamper_is_reported_when_store_is_read_only() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, "hello").unwrap();
        let checker = memory_checker();
        let path = checker.add(&file, "").unwrap().path;
        checker.backend().set_read_only(true);
        fs::write(&file, "world").unwrap();

        let checked = checker.verify(&file).unwrap();
        assert_eq!(checked.value.status(), VerifyStatus::Tampered);
        assert!(checked.persist_error.is_some());

        let all = checker.verify_all();
        assert_eq!(all.value[&path].status(), VerifyStatus::Tampered);
        assert!(matches!(all.persist_error, Some(EngineError::Persist { .. })));
        assert!(matches!(all.into_result(), Err(EngineError::Persist { .. })));
    }

    #[test]
    fn import_bad_source_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, "hello").unwrap();
        let bad = dir.path().join("bad.json");
        fs::write(&bad, "not json at all").unwrap();
        let checker = memory_checker();
        checker.add(&file, "").unwrap();
        let before = checker.snapshot();

        let err = checker.import(&bad, ImportMode::Replace).unwrap_err();
        assert!(matches!(err, EngineError::Parse(_)));
        assert_eq!(checker.snapshot(), before);
        assert_eq!(checker.backend().save_count(), 1);
    }
}
