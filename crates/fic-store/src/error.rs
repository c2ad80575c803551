use std::io;
use std::path::PathBuf;

/// Errors from record store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O error reading or writing a store file.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file exists but is not a valid store document.
    #[error("malformed store file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The in-memory store could not be encoded (e.g. a non-UTF-8 path key).
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Storage backend refuses writes.
    #[error("store is read-only")]
    ReadOnly,
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
