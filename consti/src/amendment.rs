//! Amendments: the frozen record of an implemented proposal.

use mirror_governance::{Proposal, VoteTally};
use mirror_types::{ProposalId, Timestamp, UserId};
use serde::{Deserialize, Serialize};

use crate::error::ConstiError;

/// Snapshot of the vote a proposal passed with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteResults {
    pub approve: u64,
    pub reject: u64,
    pub abstain: u64,
    pub requires_super_majority: bool,
    /// Approval share of approve + reject, basis points, rounded down.
    pub approval_bps: u32,
}

impl VoteResults {
    pub fn snapshot(tally: &VoteTally, requires_super_majority: bool) -> Self {
        Self {
            approve: tally.approve,
            reject: tally.reject,
            abstain: tally.abstain,
            requires_super_majority,
            approval_bps: tally.approval_bps(),
        }
    }
}

/// An implemented proposal. Never modified or removed once written.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Amendment {
    /// Position in the amendment history, starting at 1.
    pub number: u64,
    pub proposal_id: ProposalId,
    pub title: String,
    pub full_text: String,
    /// Text of the superseded sections, if any of them existed.
    pub before_text: Option<String>,
    pub affected_sections: Vec<String>,
    pub vote_results: VoteResults,
    pub proposer: UserId,
    pub implemented_at: Timestamp,
}

impl Amendment {
    pub fn freeze(
        number: u64,
        proposal: &Proposal,
        before_text: Option<String>,
        implemented_at: Timestamp,
    ) -> Self {
        Self {
            number,
            proposal_id: proposal.id,
            title: proposal.title.clone(),
            full_text: proposal.full_text.clone(),
            before_text,
            affected_sections: proposal.affected_sections.clone(),
            vote_results: VoteResults::snapshot(&proposal.votes, proposal.requires_super_majority),
            proposer: proposal.proposer.clone(),
            implemented_at,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ConstiError> {
        bincode::serialize(self).map_err(|e| ConstiError::Encoding(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConstiError> {
        bincode::deserialize(bytes).map_err(|e| ConstiError::Encoding(e.to_string()))
    }
}
