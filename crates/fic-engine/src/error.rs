//! Error types for the engine crate.

use std::path::PathBuf;

use fic_crypto::HasherError;
use fic_store::StoreError;

/// Errors that can occur during engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The file to add does not exist.
    #[error("file does not exist: {}", .0.display())]
    NotFound(PathBuf),

    /// The path is empty, not a regular file, or cannot be made absolute.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// The file's digest could not be computed.
    #[error("could not hash {}: {source}", path.display())]
    Hash {
        path: PathBuf,
        #[source]
        source: HasherError,
    },

    /// The updated store could not be written back.
    #[error("could not save integrity database at {location}: {source}")]
    Persist {
        location: String,
        #[source]
        source: StoreError,
    },

    /// An import source is not a valid store document.
    #[error(transparent)]
    Parse(StoreError),

    /// Reading an import source or writing an export failed.
    #[error(transparent)]
    Io(StoreError),

    /// The configured default algorithm is not registered.
    #[error("unsupported hash algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The configuration file could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Parse { .. } => Self::Parse(err),
            other => Self::Io(other),
        }
    }
}

/// Convenience alias for engine results.
pub type EngineResult<T> = Result<T, EngineError>;
