//! Governance proposals and their lifecycle.

use mirror_types::{ProposalId, Timestamp, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ClosedReason, FieldViolation, GovernanceError};
use crate::params::GovernanceParams;
use crate::vote::VoteTally;

/// Status of a proposal. Transitions only move forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalStatus {
    /// Composed, awaiting guardian review.
    Draft,
    /// Admitted by a guardian; accepting votes until the deadline.
    Voting,
    /// Met its threshold. Awaiting implementation.
    Passed,
    /// Missed its threshold at the deadline. Terminal.
    Rejected,
    /// Frozen into an amendment. Terminal.
    Implemented,
    /// Stopped by a guardian. Terminal.
    Vetoed,
}

impl ProposalStatus {
    pub const ALL: [Self; 6] = [
        Self::Draft,
        Self::Voting,
        Self::Passed,
        Self::Rejected,
        Self::Implemented,
        Self::Vetoed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Voting => "voting",
            Self::Passed => "passed",
            Self::Rejected => "rejected",
            Self::Implemented => "implemented",
            Self::Vetoed => "vetoed",
        }
    }

    pub fn can_transition_to(&self, next: ProposalStatus) -> bool {
        use ProposalStatus::*;
        matches!(
            (self, next),
            (Draft, Voting)
                | (Draft, Vetoed)
                | (Voting, Passed)
                | (Voting, Rejected)
                | (Voting, Vetoed)
                | (Passed, Implemented)
        )
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProposalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown proposal status {s:?}"))
    }
}

/// A guardian's veto.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VetoRecord {
    pub guardian: UserId,
    pub reason: String,
    pub vetoed_at: Timestamp,
}

/// A governance proposal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    pub id: ProposalId,
    pub title: String,
    pub description: String,
    pub full_text: String,
    pub rationale: String,
    pub status: ProposalStatus,
    /// Fixed at creation. Chooses the supermajority threshold over simple majority.
    pub requires_super_majority: bool,
    /// Set on admission. Votes are accepted strictly before this instant.
    pub voting_deadline: Option<Timestamp>,
    pub votes: VoteTally,
    pub proposer: UserId,
    /// Constitution sections this proposal supersedes. Empty adds a new article.
    pub affected_sections: Vec<String>,
    pub created_at: Timestamp,
    pub admitted_at: Option<Timestamp>,
    pub resolved_at: Option<Timestamp>,
    pub implemented_at: Option<Timestamp>,
    pub veto: Option<VetoRecord>,
}

impl Proposal {
    /// Build a fresh draft. The draft must already be validated.
    pub fn from_draft(
        id: ProposalId,
        proposer: UserId,
        draft: ProposalDraft,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            title: draft.title,
            description: draft.description,
            full_text: draft.full_text,
            rationale: draft.rationale,
            status: ProposalStatus::Draft,
            requires_super_majority: draft.requires_super_majority,
            voting_deadline: None,
            votes: VoteTally::default(),
            proposer,
            affected_sections: draft.affected_sections,
            created_at,
            admitted_at: None,
            resolved_at: None,
            implemented_at: None,
            veto: None,
        }
    }

    /// Fails with `VotingClosed` unless the proposal is voting and `now` is before the deadline.
    pub fn ensure_open(&self, now: Timestamp) -> Result<(), GovernanceError> {
        let closed = |reason| GovernanceError::VotingClosed {
            id: self.id,
            reason,
        };
        if self.status != ProposalStatus::Voting {
            return Err(closed(ClosedReason::NotVoting {
                status: self.status,
            }));
        }
        match self.voting_deadline {
            Some(deadline) if now < deadline => Ok(()),
            Some(deadline) => Err(closed(ClosedReason::DeadlinePassed { deadline })),
            None => Err(closed(ClosedReason::NotVoting {
                status: self.status,
            })),
        }
    }

    /// Move to `next`, rejecting backward or skipping transitions.
    pub fn transition(&mut self, next: ProposalStatus) -> Result<(), GovernanceError> {
        if !self.status.can_transition_to(next) {
            return Err(GovernanceError::InvalidTransition {
                id: self.id,
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// Whether the deadline has been reached.
    pub fn deadline_reached(&self, now: Timestamp) -> bool {
        self.voting_deadline.is_some_and(|deadline| now >= deadline)
    }
}

/// Input to proposal composition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalDraft {
    pub title: String,
    pub description: String,
    pub full_text: String,
    pub rationale: String,
    #[serde(default)]
    pub requires_super_majority: bool,
    #[serde(default)]
    pub affected_sections: Vec<String>,
}

impl ProposalDraft {
    /// Check every field against the composition minimums and collect all
    /// violations. Lengths count characters after trimming surrounding
    /// whitespace; the stored text itself is kept exactly as submitted.
    pub fn validate(&self, params: &GovernanceParams) -> Result<(), GovernanceError> {
        let mut violations = Vec::new();
        let fields = [
            ("title", &self.title, params.title_min_len),
            ("description", &self.description, params.description_min_len),
            ("fullText", &self.full_text, params.full_text_min_len),
            ("rationale", &self.rationale, params.rationale_min_len),
        ];
        for (name, value, min) in fields {
            let len = value.trim().chars().count();
            if len < min {
                violations.push(FieldViolation::new(
                    name,
                    format!("must be at least {min} characters, got {len}"),
                ));
            }
        }

        let mut seen = std::collections::HashSet::new();
        for section in &self.affected_sections {
            if section.trim().is_empty() {
                violations.push(FieldViolation::new(
                    "affectedSections",
                    "section keys must not be blank",
                ));
            } else if !seen.insert(section.as_str()) {
                violations.push(FieldViolation::new(
                    "affectedSections",
                    format!("section {section:?} is listed twice"),
                ));
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(GovernanceError::Validation(violations))
        }
    }
}
