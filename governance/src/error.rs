use std::fmt;

use mirror_store::StoreError;
use mirror_types::{ProposalId, Timestamp, UserId};
use serde::Serialize;
use thiserror::Error;

use crate::proposal::ProposalStatus;

/// A single failed field check on a draft or vote.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: &'static str,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Why a proposal no longer accepts votes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClosedReason {
    DeadlinePassed { deadline: Timestamp },
    NotVoting { status: ProposalStatus },
}

impl fmt::Display for ClosedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeadlinePassed { deadline } => write!(f, "deadline {deadline} has passed"),
            Self::NotVoting { status } => write!(f, "proposal is {status}"),
        }
    }
}

#[derive(Debug, Error)]
pub enum GovernanceError {
    #[error("proposal {0} not found")]
    ProposalNotFound(ProposalId),

    #[error("voting on proposal {id} is closed: {reason}")]
    VotingClosed { id: ProposalId, reason: ClosedReason },

    #[error("{voter} has already voted on proposal {proposal}")]
    AlreadyVoted { proposal: ProposalId, voter: UserId },

    #[error("invalid vote choice {0:?}: expected approve, reject or abstain")]
    InvalidChoice(String),

    #[error("validation failed: {}", join_violations(.0))]
    Validation(Vec<FieldViolation>),

    #[error("proposal {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: ProposalId,
        from: ProposalStatus,
        to: ProposalStatus,
    },

    #[error("voting deadline {deadline} must be at least {min_secs}s after {now}")]
    InvalidDeadline {
        deadline: Timestamp,
        now: Timestamp,
        min_secs: u64,
    },

    #[error("voting on proposal {id} is open until {deadline}")]
    VotingStillOpen { id: ProposalId, deadline: Timestamp },

    #[error("proposal {0} is under heavy contention, retry later")]
    Contended(ProposalId),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("record encoding error: {0}")]
    Encoding(String),
}

impl GovernanceError {
    /// Errors a caller may retry with backoff; everything else is final for
    /// the given input.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Contended(_) => true,
            Self::Store(e) => matches!(e, StoreError::Backend(_) | StoreError::Conflict { .. }),
            _ => false,
        }
    }

    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldViolation::new(field, message)])
    }
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
