use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use sha2::Digest;

/// Bytes read per iteration when hashing a file.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// A running hash computation.
///
/// Chunks are folded in with [`update`](DigestState::update); the final
/// digest is produced as lowercase hex.
pub trait DigestState {
    fn update(&mut self, chunk: &[u8]);
    fn finalize_hex(self: Box<Self>) -> String;
}

/// Constructs a fresh [`DigestState`] for one algorithm.
pub type DigestConstructor = fn() -> Box<dyn DigestState>;

struct Sha2State<D>(D);

impl<D: Digest> DigestState for Sha2State<D> {
    fn update(&mut self, chunk: &[u8]) {
        Digest::update(&mut self.0, chunk);
    }

    fn finalize_hex(self: Box<Self>) -> String {
        hex::encode(self.0.finalize())
    }
}

struct Blake3State(blake3::Hasher);

impl DigestState for Blake3State {
    fn update(&mut self, chunk: &[u8]) {
        self.0.update(chunk);
    }

    fn finalize_hex(self: Box<Self>) -> String {
        self.0.finalize().to_hex().to_string()
    }
}

fn sha224() -> Box<dyn DigestState> {
    Box::new(Sha2State(sha2::Sha224::new()))
}

fn sha256() -> Box<dyn DigestState> {
    Box::new(Sha2State(sha2::Sha256::new()))
}

fn sha384() -> Box<dyn DigestState> {
    Box::new(Sha2State(sha2::Sha384::new()))
}

fn sha512() -> Box<dyn DigestState> {
    Box::new(Sha2State(sha2::Sha512::new()))
}

fn blake3() -> Box<dyn DigestState> {
    Box::new(Blake3State(blake3::Hasher::new()))
}

/// Name → constructor lookup for supported hash algorithms.
///
/// Names are normalized before lookup: lowercased, with `-` and `_`
/// removed, so `SHA-256`, `sha_256` and `sha256` all resolve to the same
/// entry. Records store the normalized name.
#[derive(Clone)]
pub struct AlgorithmRegistry {
    constructors: BTreeMap<String, DigestConstructor>,
}

impl AlgorithmRegistry {
    /// A registry with no algorithms.
    pub fn empty() -> Self {
        Self {
            constructors: BTreeMap::new(),
        }
    }

    /// A registry with the built-in SHA-2 family and BLAKE3.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register("sha224", sha224);
        registry.register("sha256", sha256);
        registry.register("sha384", sha384);
        registry.register("sha512", sha512);
        registry.register("blake3", blake3);
        registry
    }

    /// Canonical form of an algorithm name.
    pub fn normalize(name: &str) -> String {
        name.chars()
            .filter(|c| *c != '-' && *c != '_')
            .flat_map(char::to_lowercase)
            .collect()
    }

    /// Register (or replace) an algorithm under `name`.
    pub fn register(&mut self, name: &str, constructor: DigestConstructor) {
        self.constructors.insert(Self::normalize(name), constructor);
    }

    /// Returns `true` if `name` resolves to a registered algorithm.
    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(&Self::normalize(name))
    }

    /// Registered algorithm names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.constructors.keys().map(String::as_str).collect()
    }

    /// Start a new hash computation for `name`.
    pub fn start(&self, name: &str) -> HasherResult<Box<dyn DigestState>> {
        self.constructors
            .get(&Self::normalize(name))
            .map(|ctor| ctor())
            .ok_or_else(|| HasherError::UnsupportedAlgorithm(name.to_string()))
    }
}

impl Default for AlgorithmRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for AlgorithmRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlgorithmRegistry")
            .field("algorithms", &self.names())
            .finish()
    }
}

/// Streams files through a registered algorithm in bounded chunks.
#[derive(Clone, Debug)]
pub struct FileHasher {
    registry: AlgorithmRegistry,
    chunk_size: usize,
}

impl FileHasher {
    /// Create a hasher over `registry` reading `chunk_size` bytes at a time.
    ///
    /// A zero chunk size is bumped to one byte.
    pub fn new(registry: AlgorithmRegistry, chunk_size: usize) -> Self {
        Self {
            registry,
            chunk_size: chunk_size.max(1),
        }
    }

    /// The algorithm registry backing this hasher.
    pub fn registry(&self) -> &AlgorithmRegistry {
        &self.registry
    }

    /// Bytes read per iteration.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Hex digest of the file at `path` under `algorithm`.
    pub fn digest_file(&self, path: &Path, algorithm: &str) -> HasherResult<String> {
        // Resolve the algorithm before touching the filesystem.
        let state = self.registry.start(algorithm)?;
        let file = File::open(path).map_err(|source| HasherError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let (digest, bytes) = self
            .fold(state, file)
            .map_err(|source| HasherError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        tracing::debug!(path = %path.display(), algorithm, bytes, "computed file digest");
        Ok(digest)
    }

    /// Hex digest of everything readable from `reader` under `algorithm`.
    pub fn digest_reader<R: Read>(&self, reader: R, algorithm: &str) -> HasherResult<String> {
        let state = self.registry.start(algorithm)?;
        let (digest, _) = self.fold(state, reader)?;
        Ok(digest)
    }

    fn fold<R: Read>(
        &self,
        mut state: Box<dyn DigestState>,
        mut reader: R,
    ) -> io::Result<(String, u64)> {
        let mut buf = vec![0u8; self.chunk_size];
        let mut total = 0u64;
        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            state.update(&buf[..n]);
            total += n as u64;
        }
        Ok((state.finalize_hex(), total))
    }
}

impl Default for FileHasher {
    fn default() -> Self {
        Self::new(AlgorithmRegistry::with_builtins(), DEFAULT_CHUNK_SIZE)
    }
}

/// Errors from hashing operations.
#[derive(Debug, thiserror::Error)]
pub enum HasherError {
    /// The file could not be opened or read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A non-file reader failed.
    #[error("read error: {0}")]
    Read(#[from] io::Error),

    /// No algorithm is registered under this name.
    #[error("unsupported hash algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

/// Result alias for hashing operations.
pub type HasherResult<T> = Result<T, HasherError>;
