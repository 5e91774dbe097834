//! LMDB storage backend for The Mirror governance backend.
//!
//! Implements the `mirror-store` traits using the `heed` LMDB bindings.
//! All logical stores live as named databases inside a single environment,
//! so any commit touching several of them runs in one write transaction.
//! LMDB admits one writer at a time, which serialises every
//! read-check-write sequence performed inside a commit.

pub mod amendment;
pub mod environment;
pub mod error;
pub mod governance;
pub mod keys;
pub mod migration;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use governance::LmdbGovernanceStore;
