//! Proposal creation, reads and guardian-driven status changes.

use std::sync::Arc;

use mirror_store::{GovernanceStore, StoreError};
use mirror_types::{Clock, ProposalId, Timestamp, UserId};

use crate::error::GovernanceError;
use crate::params::GovernanceParams;
use crate::proposal::{Proposal, ProposalDraft, ProposalStatus, VetoRecord};
use crate::record::{encode_proposal, StoredProposal};
use crate::tally;

/// Owns proposal records. Every write is a conditional update against the
/// revision that was read, retried on conflict.
pub struct ProposalLifecycle {
    store: Arc<dyn GovernanceStore>,
    clock: Arc<dyn Clock>,
    params: GovernanceParams,
}

impl ProposalLifecycle {
    pub fn new(
        store: Arc<dyn GovernanceStore>,
        clock: Arc<dyn Clock>,
        params: GovernanceParams,
    ) -> Self {
        Self {
            store,
            clock,
            params,
        }
    }

    pub fn params(&self) -> &GovernanceParams {
        &self.params
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    pub(crate) fn store(&self) -> &dyn GovernanceStore {
        self.store.as_ref()
    }

    /// Validate a draft and store it in `draft` status.
    pub fn submit_draft(
        &self,
        proposer: &UserId,
        draft: ProposalDraft,
    ) -> Result<Proposal, GovernanceError> {
        draft.validate(&self.params)?;
        let created_at = self.clock.now();
        let nonce = self.store.next_nonce()?;
        let id = ProposalId::derive(proposer, &draft.title, created_at, nonce);
        let proposal = Proposal::from_draft(id, proposer.clone(), draft, created_at);
        self.store.insert_proposal(&id, &encode_proposal(&proposal)?)?;
        tracing::info!(
            proposal = %id,
            proposer = %proposer,
            super_majority = proposal.requires_super_majority,
            "draft submitted"
        );
        Ok(proposal)
    }

    pub fn get(&self, id: &ProposalId) -> Result<Proposal, GovernanceError> {
        Ok(self.load(id)?.proposal)
    }

    /// Read a proposal together with its storage revision.
    pub fn load(&self, id: &ProposalId) -> Result<StoredProposal, GovernanceError> {
        match self.store.get_proposal(id) {
            Ok(versioned) => StoredProposal::from_versioned(versioned),
            Err(StoreError::NotFound(_)) => Err(GovernanceError::ProposalNotFound(*id)),
            Err(e) => Err(e.into()),
        }
    }

    /// Proposals ordered by creation time, then id. `None` lists every status.
    pub fn list(&self, status: Option<ProposalStatus>) -> Result<Vec<Proposal>, GovernanceError> {
        let mut out = Vec::new();
        for (_, versioned) in self.store.list_proposals()? {
            let stored = StoredProposal::from_versioned(versioned)?;
            if status.map_or(true, |s| stored.proposal.status == s) {
                out.push(stored.proposal);
            }
        }
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(out)
    }

    /// Open a draft for voting.
    ///
    /// Without an explicit deadline the default voting period applies. A
    /// deadline closer than the minimum voting period is refused.
    pub fn admit_to_voting(
        &self,
        id: &ProposalId,
        guardian: &UserId,
        deadline: Option<Timestamp>,
    ) -> Result<Proposal, GovernanceError> {
        let now = self.clock.now();
        let deadline =
            deadline.unwrap_or_else(|| now.plus_secs(self.params.default_voting_period_secs));
        let earliest = now.plus_secs(self.params.min_voting_period_secs);
        if deadline < earliest {
            return Err(GovernanceError::InvalidDeadline {
                deadline,
                now,
                min_secs: self.params.min_voting_period_secs,
            });
        }

        let (proposal, _) = self.update_with(id, |p| {
            p.transition(ProposalStatus::Voting)?;
            p.voting_deadline = Some(deadline);
            p.admitted_at = Some(now);
            Ok(true)
        })?;
        tracing::info!(proposal = %id, guardian = %guardian, %deadline, "admitted to voting");
        Ok(proposal)
    }

    /// Stop a draft or voting proposal for good.
    pub fn veto(
        &self,
        id: &ProposalId,
        guardian: &UserId,
        reason: &str,
    ) -> Result<Proposal, GovernanceError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(GovernanceError::validation("reason", "a veto needs a reason"));
        }
        let now = self.clock.now();
        let (proposal, _) = self.update_with(id, |p| {
            p.transition(ProposalStatus::Vetoed)?;
            p.veto = Some(VetoRecord {
                guardian: guardian.clone(),
                reason: reason.to_string(),
                vetoed_at: now,
            });
            p.resolved_at = Some(now);
            Ok(true)
        })?;
        tracing::warn!(proposal = %id, guardian = %guardian, reason, "proposal vetoed");
        Ok(proposal)
    }

    /// Settle a proposal whose deadline has been reached.
    ///
    /// Calling it again on a settled proposal returns the current status and
    /// writes nothing.
    pub fn resolve(&self, id: &ProposalId) -> Result<ProposalStatus, GovernanceError> {
        self.resolve_at(id, self.clock.now()).map(|(status, _)| status)
    }

    /// Resolve every voting proposal whose deadline has been reached.
    ///
    /// Returns the proposals this call settled. A failure on one proposal is
    /// logged and does not stop the others; the next sweep retries it.
    pub fn resolve_expired(&self) -> Result<Vec<(ProposalId, ProposalStatus)>, GovernanceError> {
        let now = self.clock.now();
        let mut changes = Vec::new();
        for proposal in self.list(Some(ProposalStatus::Voting))? {
            if !proposal.deadline_reached(now) {
                continue;
            }
            match self.resolve_at(&proposal.id, now) {
                Ok((status, true)) => changes.push((proposal.id, status)),
                Ok((_, false)) => {}
                Err(e) => {
                    tracing::warn!(proposal = %proposal.id, error = %e, "failed to resolve expired proposal")
                }
            }
        }
        Ok(changes)
    }

    fn resolve_at(
        &self,
        id: &ProposalId,
        now: Timestamp,
    ) -> Result<(ProposalStatus, bool), GovernanceError> {
        let params = &self.params;
        let (proposal, changed) = self.update_with(id, |p| {
            match p.status {
                ProposalStatus::Voting => {}
                ProposalStatus::Draft => {
                    return Err(GovernanceError::InvalidTransition {
                        id: p.id,
                        from: p.status,
                        to: ProposalStatus::Rejected,
                    })
                }
                _ => return Ok(false),
            }
            match p.voting_deadline {
                Some(deadline) if now < deadline => {
                    return Err(GovernanceError::VotingStillOpen { id: p.id, deadline })
                }
                _ => {}
            }
            let outcome = tally::final_outcome(&p.votes, p.requires_super_majority, params);
            p.transition(outcome)?;
            p.resolved_at = Some(now);
            Ok(true)
        })?;
        if changed {
            tracing::info!(
                proposal = %id,
                outcome = %proposal.status,
                approve = proposal.votes.approve,
                reject = proposal.votes.reject,
                abstain = proposal.votes.abstain,
                "proposal resolved"
            );
        }
        Ok((proposal.status, changed))
    }

    /// Apply `change` to the latest revision of a proposal and write it back.
    ///
    /// `change` returns whether it modified the proposal; when it did not,
    /// nothing is written. Revision conflicts reload and reapply, up to
    /// `max_write_attempts` times.
    pub(crate) fn update_with<F>(
        &self,
        id: &ProposalId,
        mut change: F,
    ) -> Result<(Proposal, bool), GovernanceError>
    where
        F: FnMut(&mut Proposal) -> Result<bool, GovernanceError>,
    {
        for attempt in 1..=self.params.max_write_attempts {
            let StoredProposal {
                revision,
                mut proposal,
            } = self.load(id)?;
            if !change(&mut proposal)? {
                return Ok((proposal, false));
            }
            match self
                .store
                .update_proposal(id, revision, &encode_proposal(&proposal)?)
            {
                Ok(_) => return Ok((proposal, true)),
                Err(StoreError::Conflict { found, .. }) => {
                    tracing::debug!(proposal = %id, attempt, expected = revision, found, "proposal changed underneath update, retrying");
                    std::thread::yield_now();
                }
                Err(StoreError::NotFound(_)) => return Err(GovernanceError::ProposalNotFound(*id)),
                Err(e) => return Err(e.into()),
            }
        }
        tracing::warn!(proposal = %id, attempts = self.params.max_write_attempts, "giving up on contended proposal update");
        Err(GovernanceError::Contended(*id))
    }
}
