//! Parse errors for the shared types.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid proposal id: {0}")]
    InvalidProposalId(String),

    #[error("invalid user id: {0}")]
    InvalidUserId(String),
}
