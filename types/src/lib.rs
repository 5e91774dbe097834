//! Fundamental types for The Mirror governance backend.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! proposal identifiers, user identities, timestamps and the clock abstraction.

pub mod error;
pub mod id;
pub mod time;
pub mod user;

pub use error::TypeError;
pub use id::ProposalId;
pub use time::{Clock, SystemClock, Timestamp};
pub use user::UserId;
