//! Storage encoding for proposals and votes.
//!
//! Records are bincode. The store sees opaque bytes plus a revision counter.

use mirror_store::Versioned;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::GovernanceError;
use crate::proposal::Proposal;
use crate::vote::Vote;

/// A proposal as last read from the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredProposal {
    /// Revision to hand back on the next conditional write.
    pub revision: u64,
    pub proposal: Proposal,
}

impl StoredProposal {
    pub fn from_versioned(versioned: Versioned) -> Result<Self, GovernanceError> {
        Ok(Self {
            revision: versioned.revision,
            proposal: decode(&versioned.data)?,
        })
    }
}

pub fn encode_proposal(proposal: &Proposal) -> Result<Vec<u8>, GovernanceError> {
    encode(proposal)
}

pub fn decode_proposal(bytes: &[u8]) -> Result<Proposal, GovernanceError> {
    decode(bytes)
}

pub fn encode_vote(vote: &Vote) -> Result<Vec<u8>, GovernanceError> {
    encode(vote)
}

pub fn decode_vote(bytes: &[u8]) -> Result<Vote, GovernanceError> {
    decode(bytes)
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, GovernanceError> {
    bincode::serialize(value).map_err(|e| GovernanceError::Encoding(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, GovernanceError> {
    bincode::deserialize(bytes).map_err(|e| GovernanceError::Encoding(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proposal::{ProposalDraft, ProposalStatus, VetoRecord};
    use crate::vote::VoteChoice;
    use mirror_types::{ProposalId, Timestamp, UserId};

    #[test]
    fn vetoed_proposal_survives_storage() {
        let mut proposal = Proposal::from_draft(
            ProposalId::new([4; 32]),
            UserId::parse("author").unwrap(),
            ProposalDraft {
                title: "Open the archive".into(),
                description: "Make past reflections searchable.".into(),
                full_text: "a".repeat(120),
                rationale: "b".repeat(60),
                requires_super_majority: true,
                affected_sections: vec!["article-2".into()],
            },
            Timestamp::new(10),
        );
        proposal.status = ProposalStatus::Vetoed;
        proposal.veto = Some(VetoRecord {
            guardian: UserId::parse("guardian").unwrap(),
            reason: "duplicates article 2".into(),
            vetoed_at: Timestamp::new(20),
        });

        let stored = StoredProposal::from_versioned(Versioned {
            revision: 3,
            data: encode_proposal(&proposal).unwrap(),
        })
        .unwrap();
        assert_eq!(stored.revision, 3);
        assert_eq!(stored.proposal, proposal);
    }

    #[test]
    fn vote_without_comment_decodes() {
        let vote = Vote {
            proposal_id: ProposalId::new([4; 32]),
            voter: UserId::parse("voter").unwrap(),
            choice: VoteChoice::Abstain,
            comment: None,
            cast_at: Timestamp::new(30),
        };
        assert_eq!(decode_vote(&encode_vote(&vote).unwrap()).unwrap(), vote);
    }

    #[test]
    fn garbage_is_an_encoding_error() {
        assert!(matches!(
            decode_proposal(&[0xff, 0x01]),
            Err(GovernanceError::Encoding(_))
        ));
    }
}
