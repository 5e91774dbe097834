//! Vote casting.
//!
//! A vote and the tally change it causes are written by a single
//! [`GovernanceStore::commit_vote`] call, conditional on the proposal revision
//! the tally was computed from. Two voters racing on the same proposal both
//! read revision `r`; the store admits one commit and refuses the other with a
//! conflict, and the loser recomputes from `r + 1`.

use std::sync::Arc;

use mirror_store::{StoreError, VoteCommit};
use mirror_types::{ProposalId, UserId};

use crate::error::GovernanceError;
use crate::lifecycle::ProposalLifecycle;
use crate::proposal::ProposalStatus;
use crate::record::{decode_vote, encode_proposal, encode_vote, StoredProposal};
use crate::tally;
use crate::vote::{Vote, VoteChoice, VoteReceipt, VoteTally};

pub struct VotingEngine {
    lifecycle: Arc<ProposalLifecycle>,
}

impl VotingEngine {
    pub fn new(lifecycle: Arc<ProposalLifecycle>) -> Self {
        Self { lifecycle }
    }

    pub fn lifecycle(&self) -> &Arc<ProposalLifecycle> {
        &self.lifecycle
    }

    /// Cast `voter`'s one vote on a proposal.
    ///
    /// A supermajority proposal that reaches the early-resolution quorum with
    /// enough approval passes as part of the same commit.
    pub fn cast_vote(
        &self,
        id: &ProposalId,
        voter: &UserId,
        choice: VoteChoice,
        comment: Option<String>,
    ) -> Result<VoteReceipt, GovernanceError> {
        let params = self.lifecycle.params();
        let comment = normalize_comment(comment, params.comment_max_len)?;
        let store = self.lifecycle.store();

        for attempt in 1..=params.max_write_attempts {
            let StoredProposal {
                revision,
                mut proposal,
            } = self.lifecycle.load(id)?;
            let now = self.lifecycle.now();
            proposal.ensure_open(now)?;
            if store.get_vote(id, voter)?.is_some() {
                return Err(already_voted(id, voter));
            }

            let vote = Vote {
                proposal_id: *id,
                voter: voter.clone(),
                choice,
                comment: comment.clone(),
                cast_at: now,
            };
            proposal.votes.record(choice);
            if tally::passes_early(&proposal.votes, proposal.requires_super_majority, params) {
                proposal.transition(ProposalStatus::Passed)?;
                proposal.resolved_at = Some(now);
            }

            let proposal_data = encode_proposal(&proposal)?;
            let vote_data = encode_vote(&vote)?;
            let commit = VoteCommit {
                proposal: id,
                voter,
                expected_revision: revision,
                proposal_data: &proposal_data,
                vote_data: &vote_data,
            };
            match store.commit_vote(&commit) {
                Ok(_) => {
                    tracing::debug!(
                        proposal = %id,
                        voter = %voter,
                        %choice,
                        approve = proposal.votes.approve,
                        reject = proposal.votes.reject,
                        abstain = proposal.votes.abstain,
                        "vote committed"
                    );
                    if proposal.status == ProposalStatus::Passed {
                        tracing::info!(proposal = %id, "supermajority reached, passed early");
                    }
                    return Ok(VoteReceipt {
                        proposal_id: *id,
                        voter: voter.clone(),
                        choice,
                        cast_at: now,
                        votes: proposal.votes,
                        status: proposal.status,
                    });
                }
                Err(StoreError::Duplicate(_)) => return Err(already_voted(id, voter)),
                Err(StoreError::NotFound(_)) => return Err(GovernanceError::ProposalNotFound(*id)),
                Err(StoreError::Conflict { found, .. }) => {
                    tracing::debug!(proposal = %id, voter = %voter, attempt, expected = revision, found, "tally moved, recomputing vote");
                    std::thread::yield_now();
                }
                Err(e) => return Err(e.into()),
            }
        }

        tracing::warn!(proposal = %id, voter = %voter, attempts = params.max_write_attempts, "vote cast exhausted retries");
        Err(GovernanceError::Contended(*id))
    }

    /// Every vote on a proposal, in voter order.
    pub fn votes(&self, id: &ProposalId) -> Result<Vec<Vote>, GovernanceError> {
        self.lifecycle.load(id)?;
        self.lifecycle
            .store()
            .list_votes(id)?
            .iter()
            .map(|raw| decode_vote(raw))
            .collect()
    }

    pub fn vote_of(&self, id: &ProposalId, voter: &UserId) -> Result<Option<Vote>, GovernanceError> {
        self.lifecycle
            .store()
            .get_vote(id, voter)?
            .map(|raw| decode_vote(&raw))
            .transpose()
    }

    /// Recompute a proposal's tally from its stored votes.
    pub fn recount(&self, id: &ProposalId) -> Result<VoteTally, GovernanceError> {
        let mut tally = VoteTally::default();
        for vote in self.votes(id)? {
            tally.record(vote.choice);
        }
        Ok(tally)
    }
}

fn already_voted(id: &ProposalId, voter: &UserId) -> GovernanceError {
    GovernanceError::AlreadyVoted {
        proposal: *id,
        voter: voter.clone(),
    }
}

/// Trim a comment; blank becomes `None`.
fn normalize_comment(
    comment: Option<String>,
    max_len: usize,
) -> Result<Option<String>, GovernanceError> {
    let Some(comment) = comment else {
        return Ok(None);
    };
    let trimmed = comment.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let len = trimmed.chars().count();
    if len > max_len {
        return Err(GovernanceError::validation(
            "comment",
            format!("must be at most {max_len} characters, got {len}"),
        ));
    }
    Ok(Some(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_comments_are_dropped() {
        assert_eq!(normalize_comment(None, 10).unwrap(), None);
        assert_eq!(normalize_comment(Some("   ".into()), 10).unwrap(), None);
        assert_eq!(
            normalize_comment(Some("  agreed \n".into()), 10).unwrap(),
            Some("agreed".into())
        );
    }

    #[test]
    fn long_comments_are_refused() {
        assert!(matches!(
            normalize_comment(Some("x".repeat(11)), 10),
            Err(GovernanceError::Validation(v)) if v[0].field == "comment"
        ));
        assert!(normalize_comment(Some("é".repeat(10)), 10).is_ok());
    }
}
