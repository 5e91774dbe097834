//! Proposal and vote storage trait.

use crate::StoreError;
use mirror_types::{ProposalId, UserId};

/// A stored record together with its revision counter.
///
/// Revisions start at 1 on insert and increase by one on every successful
/// write. Writers pass the revision they read; a mismatch is a
/// [`StoreError::Conflict`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Versioned {
    pub revision: u64,
    pub data: Vec<u8>,
}

/// A vote insert and the matching proposal rewrite, applied atomically.
#[derive(Clone, Copy, Debug)]
pub struct VoteCommit<'a> {
    pub proposal: &'a ProposalId,
    pub voter: &'a UserId,
    /// Revision of the proposal the tally in `proposal_data` was computed from.
    pub expected_revision: u64,
    pub proposal_data: &'a [u8],
    pub vote_data: &'a [u8],
}

/// Trait for storing governance state (proposals and votes).
pub trait GovernanceStore: Send + Sync {
    /// Insert a new proposal at revision 1. Fails with `Duplicate` if the id exists.
    fn insert_proposal(&self, id: &ProposalId, data: &[u8]) -> Result<(), StoreError>;

    /// Get a proposal by id.
    fn get_proposal(&self, id: &ProposalId) -> Result<Versioned, StoreError>;

    /// All proposals, in id order.
    fn list_proposals(&self) -> Result<Vec<(ProposalId, Versioned)>, StoreError>;

    /// Replace a proposal if its revision still equals `expected_revision`.
    /// Returns the new revision.
    fn update_proposal(
        &self,
        id: &ProposalId,
        expected_revision: u64,
        data: &[u8],
    ) -> Result<u64, StoreError>;

    /// Insert a vote and rewrite its proposal in one step.
    ///
    /// Checks, in order: the proposal exists (`NotFound`), the voter has not
    /// voted on it (`Duplicate`), the proposal revision matches (`Conflict`).
    /// Returns the proposal's new revision.
    fn commit_vote(&self, commit: &VoteCommit<'_>) -> Result<u64, StoreError>;

    /// Get a specific voter's vote on a proposal.
    fn get_vote(&self, proposal: &ProposalId, voter: &UserId)
        -> Result<Option<Vec<u8>>, StoreError>;

    /// All votes for a proposal, in voter order.
    fn list_votes(&self, proposal: &ProposalId) -> Result<Vec<Vec<u8>>, StoreError>;

    /// Allocate a fresh nonce for proposal id derivation.
    fn next_nonce(&self) -> Result<u64, StoreError>;
}
