//! Amendment log and constitution storage trait.

use crate::{GovernanceStore, StoreError, Versioned};
use mirror_types::ProposalId;

/// Everything written when a passed proposal is implemented.
///
/// A backend applies all of it or none of it.
#[derive(Clone, Copy, Debug)]
pub struct AmendmentCommit<'a> {
    pub proposal: &'a ProposalId,
    pub expected_proposal_revision: u64,
    pub proposal_data: &'a [u8],
    /// Must be exactly one past the latest stored amendment number.
    pub number: u64,
    pub amendment_data: &'a [u8],
    /// Revision of the constitution record that was read; 0 when none existed.
    pub expected_constitution_revision: u64,
    pub constitution_data: &'a [u8],
}

/// Trait for the append-only amendment history and the constitution document.
pub trait AmendmentStore: GovernanceStore {
    /// Apply an [`AmendmentCommit`].
    ///
    /// Fails with `Duplicate` if the proposal already has an amendment, and
    /// with `Conflict` if the proposal revision, amendment number or
    /// constitution revision moved underneath the caller.
    fn commit_amendment(&self, commit: &AmendmentCommit<'_>) -> Result<(), StoreError>;

    /// Highest amendment number stored (0 when the log is empty).
    fn latest_amendment_number(&self) -> Result<u64, StoreError>;

    /// Amendment recorded for a proposal, if any.
    fn amendment_for_proposal(&self, proposal: &ProposalId)
        -> Result<Option<Vec<u8>>, StoreError>;

    /// All amendments in number order.
    fn list_amendments(&self) -> Result<Vec<Vec<u8>>, StoreError>;

    /// The current constitution record, if one has been written.
    fn get_constitution(&self) -> Result<Option<Versioned>, StoreError>;
}
