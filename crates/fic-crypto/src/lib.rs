//! Cryptographic digests for fic.
//!
//! Provides an [`AlgorithmRegistry`] mapping algorithm names to incremental
//! hash constructors, and a [`FileHasher`] that streams file content through
//! them in fixed-size chunks so memory use does not grow with file size.
//!
//! All hashing wraps established libraries (`sha2`, `blake3`); no custom
//! cryptography.

pub mod hasher;

pub use hasher::{
    AlgorithmRegistry, DigestConstructor, DigestState, FileHasher, HasherError, HasherResult,
    DEFAULT_CHUNK_SIZE,
};
