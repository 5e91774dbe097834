//! Abstract storage traits for The Mirror governance backend.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. Records cross the boundary as opaque bytes; the governance and
//! consti crates own their encoding. Multi-record writes are expressed as
//! commit structs so a backend can apply them inside a single transaction.

pub mod amendment;
pub mod error;
pub mod governance;

pub use amendment::{AmendmentCommit, AmendmentStore};
pub use error::StoreError;
pub use governance::{GovernanceStore, Versioned, VoteCommit};
