use std::fs;
use std::path::{Path, PathBuf};

use fic_crypto::{AlgorithmRegistry, FileHasher, DEFAULT_CHUNK_SIZE};
use fic_types::DEFAULT_ALGORITHM;
use serde::{Deserialize, Serialize};

use crate::engine::IntegrityEngine;
use crate::error::{EngineError, EngineResult};

/// Database file used when none is configured.
pub const DEFAULT_STORE_PATH: &str = "integrity_database.json";

/// Settings for a [`Checker`](crate::Checker) session.
///
/// Every field is optional in a TOML file; omitted fields take their
/// defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckerConfig {
    /// Location of the JSON integrity database.
    pub store_path: PathBuf,
    /// Algorithm used to fingerprint newly added files.
    pub default_algorithm: String,
    /// Bytes read per iteration while hashing.
    pub chunk_size: usize,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            default_algorithm: DEFAULT_ALGORITHM.to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl CheckerConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(s: &str) -> EngineResult<Self> {
        toml::from_str(s).map_err(|e| EngineError::Config(e.to_string()))
    }

    /// Read and parse a TOML configuration file.
    pub fn load(path: &Path) -> EngineResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Build an engine with the built-in algorithms and these settings.
    pub fn build_engine(&self) -> EngineResult<IntegrityEngine> {
        let hasher = FileHasher::new(AlgorithmRegistry::with_builtins(), self.chunk_size);
        IntegrityEngine::new(hasher, &self.default_algorithm)
    }
}
