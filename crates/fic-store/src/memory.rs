use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

use fic_types::Timestamp;

use crate::error::{StoreError, StoreResult};
use crate::store::Store;
use crate::traits::StoreBackend;

/// In-memory store backend.
///
/// Intended for tests and embedding. The saved document is held behind a
/// `RwLock`; `load` hands out a clone. A backend can be switched to
/// read-only to exercise save-failure paths.
pub struct InMemoryBackend {
    saved: RwLock<Option<Store>>,
    read_only: AtomicBool,
    saves: AtomicUsize,
}

impl InMemoryBackend {
    /// A backend with nothing saved yet.
    pub fn new() -> Self {
        Self {
            saved: RwLock::new(None),
            read_only: AtomicBool::new(false),
            saves: AtomicUsize::new(0),
        }
    }

    /// A backend pre-seeded with `store`.
    pub fn with_store(store: Store) -> Self {
        let backend = Self::new();
        *backend.saved.write().expect("lock poisoned") = Some(store);
        backend
    }

    /// Make subsequent saves fail with [`StoreError::ReadOnly`].
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    /// The last successfully saved document, if any.
    pub fn snapshot(&self) -> Option<Store> {
        self.saved.read().expect("lock poisoned").clone()
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreBackend for InMemoryBackend {
    fn load(&self) -> Store {
        self.snapshot().unwrap_or_default()
    }

    fn save(&self, store: &mut Store) -> StoreResult<()> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(StoreError::ReadOnly);
        }
        store.touch(Timestamp::now());
        *self.saved.write().expect("lock poisoned") = Some(store.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn location(&self) -> String {
        "<memory>".to_string()
    }
}

impl std::fmt::Debug for InMemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let records = self.snapshot().map(|s| s.len()).unwrap_or(0);
        f.debug_struct("InMemoryBackend")
            .field("records", &records)
            .field("read_only", &self.read_only.load(Ordering::SeqCst))
            .finish()
    }
}
