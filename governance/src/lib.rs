//! Governance for The Mirror.
//!
//! Lifecycle: Draft → (guardian admits) Voting → Passed | Rejected → Implemented.
//! A guardian may veto from Draft or Voting; veto is terminal.
//!
//! Key principle: one identity = one vote, and a cast vote is permanent.
//! Tallies live on the proposal record and are only ever changed together
//! with the insert of the vote that caused the change.

pub mod engine;
pub mod error;
pub mod integrity;
pub mod lifecycle;
pub mod params;
pub mod proposal;
pub mod record;
pub mod tally;
pub mod vote;

pub use engine::VotingEngine;
pub use error::{ClosedReason, FieldViolation, GovernanceError};
pub use integrity::{
    DisabledIntegrityScorer, IntegrityError, IntegrityReport, IntegrityScorer, IntegrityThreat,
    ThreatSeverity,
};
pub use lifecycle::ProposalLifecycle;
pub use params::GovernanceParams;
pub use proposal::{Proposal, ProposalDraft, ProposalStatus, VetoRecord};
pub use record::StoredProposal;
pub use tally::Threshold;
pub use vote::{Vote, VoteChoice, VoteReceipt, VoteTally};
