//! The on-disk JSON database and file-level import/export.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use fic_types::Timestamp;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};
use crate::store::{ImportMode, ImportSummary, Store};
use crate::traits::StoreBackend;

/// Read and parse a store document, strictly.
pub fn read_store_file(path: &Path) -> StoreResult<Store> {
    let content = fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
    serde_json::from_str(&content).map_err(|source| StoreError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Write `store` to `path` as pretty JSON, atomically.
///
/// The document is serialized in full before anything touches the disk, then
/// written to a temp file in the destination directory and renamed into
/// place. An existing file keeps its permissions; a new one gets the usual
/// umask-filtered default rather than the temp file's private mode.
pub fn write_store_file(store: &Store, path: &Path) -> StoreResult<()> {
    let mut json = serde_json::to_string_pretty(store)?;
    json.push('\n');

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = temp_file_in(dir).map_err(|e| StoreError::io(path, e))?;
    if let Ok(existing) = fs::metadata(path) {
        tmp.as_file()
            .set_permissions(existing.permissions())
            .map_err(|e| StoreError::io(path, e))?;
    }
    tmp.write_all(json.as_bytes())
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| StoreError::io(path, e))?;
    tmp.persist(path).map_err(|e| StoreError::io(path, e.error))?;

    debug!(path = %path.display(), records = store.len(), bytes = json.len(), "wrote store file");
    Ok(())
}

fn temp_file_in(dir: &Path) -> io::Result<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(".fic-");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    builder.tempfile_in(dir)
}

/// Write `store` verbatim to `dest`, leaving its metadata untouched.
pub fn export_store(store: &Store, dest: &Path) -> StoreResult<()> {
    write_store_file(store, dest)?;
    info!(dest = %dest.display(), records = store.len(), "exported integrity database");
    Ok(())
}

/// Read `source` and fold it into `store`.
///
/// The source is parsed completely first; on any read or parse error `store`
/// is returned untouched.
pub fn import_store(store: &mut Store, source: &Path, mode: ImportMode) -> StoreResult<ImportSummary> {
    let imported = read_store_file(source)?;
    let summary = store.apply_import(imported, mode);
    info!(
        source = %source.display(),
        ?mode,
        read = summary.records_read,
        added = summary.added,
        overwritten = summary.overwritten,
        removed = summary.removed,
        "imported integrity database"
    );
    Ok(summary)
}

/// JSON database file backend.
#[derive(Clone, Debug)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StoreBackend for JsonFileBackend {
    fn load(&self) -> Store {
        match read_store_file(&self.path) {
            Ok(store) => {
                debug!(path = %self.path.display(), records = store.len(), "loaded store");
                store
            }
            Err(StoreError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no store file yet, starting empty");
                Store::new()
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "could not load integrity database, starting with an empty one");
                Store::new()
            }
        }
    }

    fn save(&self, store: &mut Store) -> StoreResult<()> {
        let previous = store.metadata.last_updated_at;
        store.touch(Timestamp::now());
        if let Err(e) = write_store_file(store, &self.path) {
            store.metadata.last_updated_at = previous;
            return Err(e);
        }
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fic_types::{IntegrityRecord, RecordState};

    fn sample_store() -> Store {
        let mut store = Store::new();
        store.insert(
            PathBuf::from("/srv/app/config.toml"),
            IntegrityRecord::new("aa", "sha256", 10, "app config", Timestamp::now()),
        );
        store
    }

    #[test]
    fn load_missing_file_gives_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let backend = JsonFileBackend::new(dir.path().join("db.json"));
        assert!(backend.load().is_empty());
    }

    #[test]
    fn load_corrupt_file_gives_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        fs::write(&path, "{ this is not json").unwrap();

        let store = JsonFileBackend::new(&path).load();
        assert!(store.is_empty());
        assert!(store.metadata.last_updated_at.is_none());
    }

    #[test]
    fn save_then_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let backend = JsonFileBackend::new(dir.path().join("db.json"));
        let mut store = sample_store();

        backend.save(&mut store).unwrap();
        assert!(store.metadata.last_updated_at.is_some());

        let loaded = backend.load();
        assert_eq!(loaded.paths(), store.paths());
        assert_eq!(
            loaded.get(Path::new("/srv/app/config.toml")).unwrap().description,
            "app config"
        );
    }

    #[test]
    fn save_into_missing_directory_fails_and_keeps_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let backend = JsonFileBackend::new(dir.path().join("no/such/dir/db.json"));
        let mut store = sample_store();

        let err = backend.save(&mut store).unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
        assert!(store.metadata.last_updated_at.is_none());
    }

    #[test]
    fn failed_write_leaves_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        let backend = JsonFileBackend::new(&path);
        let mut store = sample_store();
        backend.save(&mut store).unwrap();
        let before = fs::read_to_string(&path).unwrap();

        // A directory at the destination makes the final rename fail.
        let blocked = dir.path().join("blocked");
        fs::create_dir(&blocked).unwrap();
        assert!(write_store_file(&store, &blocked).is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), before);
        // The temp file is cleaned up on failure.
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[cfg(unix)]
    #[test]
    fn save_and_export_keep_existing_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        let dest = dir.path().join("export.json");
        let backend = JsonFileBackend::new(&path);
        let mut store = sample_store();
        backend.save(&mut store).unwrap();
        export_store(&store, &dest).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();
        fs::set_permissions(&dest, fs::Permissions::from_mode(0o640)).unwrap();

        backend.save(&mut store).unwrap();
        export_store(&store, &dest).unwrap();

        let mode = |p: &Path| fs::metadata(p).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode(&path), 0o644);
        assert_eq!(mode(&dest), 0o640);
    }

    #[cfg(unix)]
    #[test]
    fn new_file_is_not_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("export.json");
        export_store(&sample_store(), &dest).unwrap();

        // Same mode a plain create gets under the current umask.
        let plain = dir.path().join("plain.json");
        fs::write(&plain, "").unwrap();
        let mode = |p: &Path| fs::metadata(p).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode(&dest), mode(&plain));
    }

    #[test]
    fn export_writes_metadata_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("export.json");
        let store = sample_store();

        export_store(&store, &dest).unwrap();
        let exported = read_store_file(&dest).unwrap();
        assert_eq!(exported.metadata.last_updated_at, None);
        assert_eq!(exported.paths(), store.paths());
    }

    #[test]
    fn import_malformed_source_leaves_store_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("bad.json");
        fs::write(&source, "[1, 2, 3]").unwrap();
        let mut store = sample_store();
        let before = store.clone();

        let err = import_store(&mut store, &source, ImportMode::Merge).unwrap_err();
        assert!(matches!(err, StoreError::Parse { .. }));
        assert_eq!(store, before);
    }

    #[test]
    fn import_unreadable_source_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = Store::new();
        let err = import_store(&mut store, &dir.path().join("absent.json"), ImportMode::Replace)
            .unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }

    #[test]
    fn loads_database_written_by_older_tool() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("integrity_database.json");
        fs::write(
            &path,
            r#"{
  "files": {
    "/home/user/notes.txt": {
      "hash": "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824",
      "algorithm": "sha256",
      "size": 5,
      "added_date": "2024-05-01T09:00:00.000001",
      "last_checked": "2024-05-02T09:00:00.000001",
      "description": "",
      "check_count": 4,
      "status": "tampered",
      "tampered_date": "2024-05-02T09:00:00.000001"
    },
    "/home/user/legacy.bin": {
      "hash": "00",
      "size": 1,
      "added_date": "2023-01-01T00:00:00"
    }
  },
  "metadata": { "created": "2024-05-01T08:59:59.123456" }
}"#,
        )
        .unwrap();

        let store = JsonFileBackend::new(&path).load();
        assert_eq!(store.len(), 2);
        let notes = store.get(Path::new("/home/user/notes.txt")).unwrap();
        assert_eq!(notes.state(), RecordState::Tampered);
        assert_eq!(notes.check_count, 4);
        assert!(notes.tampered_at.is_some());
        let legacy = store.get(Path::new("/home/user/legacy.bin")).unwrap();
        assert_eq!(legacy.state(), RecordState::Unknown);
    }
}
