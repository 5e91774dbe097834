//! The Mirror's constitution.
//!
//! A passed proposal becomes law exactly once: its text is frozen into an
//! immutable [`Amendment`], appended to the amendment history, and applied
//! to the [`ConstitutionDocument`]. All three writes commit together.

pub mod amendment;
pub mod document;
pub mod error;
pub mod publisher;

pub use amendment::{Amendment, VoteResults};
pub use document::{Article, ConstitutionDocument};
pub use error::ConstiError;
pub use publisher::AmendmentPublisher;
