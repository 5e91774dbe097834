use mirror_governance::{GovernanceError, ProposalStatus};
use mirror_store::StoreError;
use mirror_types::ProposalId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConstiError {
    #[error("proposal {0} not found")]
    ProposalNotFound(ProposalId),

    #[error("proposal {id} is {status}, only passed proposals can be implemented")]
    NotPassed { id: ProposalId, status: ProposalStatus },

    #[error("proposal {0} has already been implemented")]
    AlreadyImplemented(ProposalId),

    #[error("constitution is under heavy contention, retry later")]
    Contended(ProposalId),

    #[error("{0}")]
    Governance(#[from] GovernanceError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("record encoding error: {0}")]
    Encoding(String),
}

impl ConstiError {
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Contended(_) => true,
            Self::Store(e) => matches!(e, StoreError::Backend(_) | StoreError::Conflict { .. }),
            Self::Governance(e) => e.is_transient(),
            _ => false,
        }
    }
}
