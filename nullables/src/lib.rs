//! Nullable infrastructure for deterministic testing.
//!
//! The clock, the governance store and the integrity scorer are traits.
//! This crate provides in-process implementations that tests drive by hand:
//! time only moves when told to, storage lives in memory and can be made to
//! report write conflicts, and integrity reports are scripted per proposal.

pub mod clock;
pub mod integrity;
pub mod store;

pub use clock::NullClock;
pub use integrity::NullIntegrityScorer;
pub use store::NullGovernanceStore;
