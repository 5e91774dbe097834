//! Votes, tallies and receipts.

use mirror_types::{ProposalId, Timestamp, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::GovernanceError;
use crate::proposal::ProposalStatus;

/// A voter's choice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteChoice {
    Approve,
    Reject,
    /// Counted toward participation but not toward the approval share.
    Abstain,
}

impl VoteChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Abstain => "abstain",
        }
    }
}

impl fmt::Display for VoteChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoteChoice {
    type Err = GovernanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "approve" => Ok(Self::Approve),
            "reject" => Ok(Self::Reject),
            "abstain" => Ok(Self::Abstain),
            _ => Err(GovernanceError::InvalidChoice(s.to_string())),
        }
    }
}

/// Running counts per choice. Only changed through a committed vote.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
    pub approve: u64,
    pub reject: u64,
    pub abstain: u64,
}

impl VoteTally {
    pub fn record(&mut self, choice: VoteChoice) {
        match choice {
            VoteChoice::Approve => self.approve += 1,
            VoteChoice::Reject => self.reject += 1,
            VoteChoice::Abstain => self.abstain += 1,
        }
    }

    /// Every vote cast.
    pub fn total(&self) -> u64 {
        self.approve + self.reject + self.abstain
    }

    /// Votes that count toward the approval share.
    pub fn decisive(&self) -> u64 {
        self.approve + self.reject
    }

    /// Approval share of decisive votes in basis points, rounded down.
    /// Zero when nobody has approved or rejected.
    pub fn approval_bps(&self) -> u32 {
        match self.decisive() {
            0 => 0,
            decisive => (self.approve * 10_000 / decisive) as u32,
        }
    }
}

impl<'a> FromIterator<&'a Vote> for VoteTally {
    fn from_iter<I: IntoIterator<Item = &'a Vote>>(votes: I) -> Self {
        let mut tally = Self::default();
        for vote in votes {
            tally.record(vote.choice);
        }
        tally
    }
}

/// A cast vote. Immutable once committed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub proposal_id: ProposalId,
    pub voter: UserId,
    pub choice: VoteChoice,
    pub comment: Option<String>,
    pub cast_at: Timestamp,
}

/// Confirmation returned to the voter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteReceipt {
    pub proposal_id: ProposalId,
    pub voter: UserId,
    pub choice: VoteChoice,
    pub cast_at: Timestamp,
    /// Tally including this vote.
    pub votes: VoteTally,
    /// Proposal status after this vote, `passed` if it triggered an early resolution.
    pub status: ProposalStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn choice_parsing_is_forgiving_about_case_only() {
        assert_eq!(" Approve ".parse::<VoteChoice>().unwrap(), VoteChoice::Approve);
        assert_eq!("REJECT".parse::<VoteChoice>().unwrap(), VoteChoice::Reject);
        assert!(matches!(
            "yes".parse::<VoteChoice>(),
            Err(GovernanceError::InvalidChoice(s)) if s == "yes"
        ));
    }

    #[test]
    fn tally_can_be_rebuilt_from_votes() {
        let vote = |voter: &str, choice| Vote {
            proposal_id: ProposalId::new([1; 32]),
            voter: UserId::parse(voter).unwrap(),
            choice,
            comment: None,
            cast_at: Timestamp::new(0),
        };
        let votes = [
            vote("ada", VoteChoice::Approve),
            vote("bo", VoteChoice::Approve),
            vote("cy", VoteChoice::Abstain),
        ];
        let tally: VoteTally = votes.iter().collect();
        assert_eq!(
            tally,
            VoteTally {
                approve: 2,
                reject: 0,
                abstain: 1
            }
        );
    }

    #[test]
    fn abstain_is_excluded_from_approval_share() {
        let mut tally = VoteTally::default();
        for choice in [VoteChoice::Approve, VoteChoice::Reject, VoteChoice::Abstain] {
            tally.record(choice);
        }
        tally.record(VoteChoice::Abstain);
        assert_eq!(tally.total(), 4);
        assert_eq!(tally.decisive(), 2);
        assert_eq!(tally.approval_bps(), 5_000);
    }

    #[test]
    fn empty_tally_has_zero_share() {
        assert_eq!(VoteTally::default().approval_bps(), 0);
    }
}
