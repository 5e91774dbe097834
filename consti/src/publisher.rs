//! Turns passed proposals into amendments.

use std::sync::Arc;

use mirror_governance::record::{encode_proposal, StoredProposal};
use mirror_governance::{GovernanceParams, ProposalStatus};
use mirror_store::{AmendmentCommit, AmendmentStore, StoreError};
use mirror_types::{Clock, ProposalId};

use crate::amendment::Amendment;
use crate::document::ConstitutionDocument;
use crate::error::ConstiError;

pub struct AmendmentPublisher {
    store: Arc<dyn AmendmentStore>,
    clock: Arc<dyn Clock>,
    max_write_attempts: u32,
}

impl AmendmentPublisher {
    pub fn new(
        store: Arc<dyn AmendmentStore>,
        clock: Arc<dyn Clock>,
        params: &GovernanceParams,
    ) -> Self {
        Self {
            store,
            clock,
            max_write_attempts: params.max_write_attempts,
        }
    }

    /// Freeze a passed proposal into the next amendment and apply it to the
    /// constitution.
    ///
    /// Exactly one amendment ever exists per proposal; a repeated call fails
    /// with `AlreadyImplemented` and writes nothing.
    pub fn implement(&self, id: &ProposalId) -> Result<Amendment, ConstiError> {
        for attempt in 1..=self.max_write_attempts {
            if self.store.amendment_for_proposal(id)?.is_some() {
                return Err(ConstiError::AlreadyImplemented(*id));
            }
            let StoredProposal {
                revision,
                mut proposal,
            } = match self.store.get_proposal(id) {
                Ok(versioned) => StoredProposal::from_versioned(versioned)?,
                Err(StoreError::NotFound(_)) => return Err(ConstiError::ProposalNotFound(*id)),
                Err(e) => return Err(e.into()),
            };
            match proposal.status {
                ProposalStatus::Passed => {}
                ProposalStatus::Implemented => return Err(ConstiError::AlreadyImplemented(*id)),
                status => return Err(ConstiError::NotPassed { id: *id, status }),
            }

            let (constitution_revision, mut document) = match self.store.get_constitution()? {
                Some(versioned) => (
                    versioned.revision,
                    ConstitutionDocument::from_bytes(&versioned.data)?,
                ),
                None => (0, ConstitutionDocument::genesis()),
            };
            let number = self.store.latest_amendment_number()? + 1;
            let now = self.clock.now();

            let before_text = document.amend(
                number,
                &proposal.title,
                &proposal.full_text,
                &proposal.affected_sections,
            );
            proposal.transition(ProposalStatus::Implemented)?;
            proposal.implemented_at = Some(now);
            let amendment = Amendment::freeze(number, &proposal, before_text, now);

            let proposal_data = encode_proposal(&proposal)?;
            let amendment_data = amendment.to_bytes()?;
            let constitution_data = document.to_bytes()?;
            let commit = AmendmentCommit {
                proposal: id,
                expected_proposal_revision: revision,
                proposal_data: &proposal_data,
                number,
                amendment_data: &amendment_data,
                expected_constitution_revision: constitution_revision,
                constitution_data: &constitution_data,
            };
            match self.store.commit_amendment(&commit) {
                Ok(()) => {
                    tracing::info!(
                        proposal = %id,
                        amendment = number,
                        version = document.version,
                        sections = ?amendment.affected_sections,
                        "amendment implemented"
                    );
                    return Ok(amendment);
                }
                Err(StoreError::Duplicate(_)) => return Err(ConstiError::AlreadyImplemented(*id)),
                Err(StoreError::NotFound(_)) => return Err(ConstiError::ProposalNotFound(*id)),
                Err(StoreError::Conflict { key, .. }) => {
                    tracing::debug!(proposal = %id, attempt, %key, "amendment raced another write, retrying");
                    std::thread::yield_now();
                }
                Err(e) => return Err(e.into()),
            }
        }
        tracing::warn!(proposal = %id, attempts = self.max_write_attempts, "implement exhausted retries");
        Err(ConstiError::Contended(*id))
    }

    /// Every amendment, oldest first.
    pub fn history(&self) -> Result<Vec<Amendment>, ConstiError> {
        self.store
            .list_amendments()?
            .iter()
            .map(|raw| Amendment::from_bytes(raw))
            .collect()
    }

    pub fn amendment_for(&self, id: &ProposalId) -> Result<Option<Amendment>, ConstiError> {
        self.store
            .amendment_for_proposal(id)?
            .map(|raw| Amendment::from_bytes(&raw))
            .transpose()
    }

    pub fn constitution(&self) -> Result<ConstitutionDocument, ConstiError> {
        match self.store.get_constitution()? {
            Some(versioned) => ConstitutionDocument::from_bytes(&versioned.data),
            None => Ok(ConstitutionDocument::genesis()),
        }
    }
}
