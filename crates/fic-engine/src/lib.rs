//! Integrity engine for fic.
//!
//! Captures file fingerprints, re-hashes files on demand and classifies each
//! one as verified, tampered, missing, unknown or errored.
//!
//! # Key Types
//!
//! - [`IntegrityEngine`] -- Stateless operations over an explicit [`Store`](fic_store::Store)
//! - [`Checker`] -- Load-mutate-save session over a [`StoreBackend`](fic_store::StoreBackend)
//! - [`Verification`] -- Classification of one file plus audit details
//! - [`RecordView`] -- Read-only projection of a record for listing
//! - [`CheckerConfig`] -- Database location, default algorithm, chunk size

pub mod checker;
pub mod config;
pub mod engine;
pub mod error;
pub mod outcome;
pub mod path;
pub mod view;

pub use checker::{Checked, Checker};
pub use config::CheckerConfig;
pub use engine::IntegrityEngine;
pub use error::{EngineError, EngineResult};
pub use outcome::{AddOutcome, Verification, VerifyOutcome, VerifyStatus, VerifySummary};
pub use path::{canonicalize, resolve_against};
pub use view::RecordView;
