use crate::error::StoreResult;
use crate::store::Store;

/// Where a [`Store`] document lives between invocations.
///
/// All implementations must satisfy these invariants:
/// - `load` never fails. An absent or unreadable store yields a fresh empty
///   one; the latter is logged as a warning.
/// - `save` stamps `last_updated_at` and writes the whole document. On error
///   the previously saved document is left as it was.
pub trait StoreBackend: Send + Sync {
    /// Load the current store, or an empty one.
    fn load(&self) -> Store;

    /// Persist `store`, updating its `last_updated_at` metadata.
    fn save(&self, store: &mut Store) -> StoreResult<()>;

    /// Human-readable location, for log and error messages.
    fn location(&self) -> String;
}
