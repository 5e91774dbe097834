//! RPC error types and their HTTP rendering.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use mirror_consti::ConstiError;
use mirror_governance::{FieldViolation, GovernanceError};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error(transparent)]
    Governance(#[from] GovernanceError),

    #[error(transparent)]
    Consti(#[from] ConstiError),

    #[error("missing caller identity header")]
    MissingIdentity,

    #[error("invalid caller identity: {0}")]
    InvalidIdentity(String),

    #[error("{0} is not a guardian")]
    NotGuardian(String),

    #[error("invalid proposal id: {0}")]
    InvalidProposalId(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Well-formed JSON that does not fit the expected body.
    #[error("malformed request body: {0}")]
    MalformedBody(String),

    #[error("server error: {0}")]
    Server(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<FieldViolation>>,
}

impl RpcError {
    /// Status code and stable machine-readable code.
    pub fn classify(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Governance(e) => classify_governance(e),
            Self::Consti(e) => match e {
                ConstiError::ProposalNotFound(_) => (StatusCode::NOT_FOUND, "proposal_not_found"),
                ConstiError::NotPassed { .. } => (StatusCode::CONFLICT, "not_passed"),
                ConstiError::AlreadyImplemented(_) => (StatusCode::CONFLICT, "conflict"),
                ConstiError::Contended(_) => (StatusCode::SERVICE_UNAVAILABLE, "contended"),
                ConstiError::Governance(e) => classify_governance(e),
                ConstiError::Store(_) => (StatusCode::SERVICE_UNAVAILABLE, "storage_unavailable"),
                ConstiError::Encoding(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
            },
            Self::MissingIdentity | Self::InvalidIdentity(_) => {
                (StatusCode::UNAUTHORIZED, "unauthenticated")
            }
            Self::NotGuardian(_) => (StatusCode::FORBIDDEN, "not_guardian"),
            Self::InvalidProposalId(_) => (StatusCode::BAD_REQUEST, "invalid_proposal_id"),
            Self::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            Self::MalformedBody(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_failed"),
            Self::Server(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        }
    }

    /// Text shown to the caller. Internal details stay in the logs.
    fn public_message(&self) -> String {
        match self {
            Self::Consti(ConstiError::AlreadyImplemented(_)) => {
                "request conflicts with the current state of the proposal".into()
            }
            Self::Server(_)
            | Self::Consti(ConstiError::Encoding(_))
            | Self::Governance(GovernanceError::Encoding(_)) => "internal server error".into(),
            Self::Governance(GovernanceError::Store(_)) | Self::Consti(ConstiError::Store(_)) => {
                "storage temporarily unavailable, retry later".into()
            }
            other => other.to_string(),
        }
    }
}

fn classify_governance(e: &GovernanceError) -> (StatusCode, &'static str) {
    match e {
        GovernanceError::ProposalNotFound(_) => (StatusCode::NOT_FOUND, "proposal_not_found"),
        GovernanceError::VotingClosed { .. } => (StatusCode::CONFLICT, "voting_closed"),
        GovernanceError::AlreadyVoted { .. } => (StatusCode::CONFLICT, "already_voted"),
        GovernanceError::InvalidChoice(_) => (StatusCode::BAD_REQUEST, "invalid_choice"),
        GovernanceError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_failed"),
        GovernanceError::InvalidDeadline { .. } => {
            (StatusCode::UNPROCESSABLE_ENTITY, "invalid_deadline")
        }
        GovernanceError::InvalidTransition { .. } => (StatusCode::CONFLICT, "invalid_transition"),
        GovernanceError::VotingStillOpen { .. } => (StatusCode::CONFLICT, "voting_still_open"),
        GovernanceError::Contended(_) => (StatusCode::SERVICE_UNAVAILABLE, "contended"),
        GovernanceError::Store(_) => (StatusCode::SERVICE_UNAVAILABLE, "storage_unavailable"),
        GovernanceError::Encoding(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let (status, code) = self.classify();
        match &self {
            Self::Consti(ConstiError::AlreadyImplemented(id)) => {
                tracing::warn!(proposal = %id, "duplicate implement request refused")
            }
            _ if status.is_server_error() => tracing::error!(error = %self, code, "request failed"),
            _ => tracing::debug!(error = %self, code, "request refused"),
        }
        let details = match &self {
            Self::Governance(GovernanceError::Validation(v)) => Some(v.clone()),
            _ => None,
        };
        let body = ErrorBody {
            error: code,
            message: self.public_message(),
            details,
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirror_types::ProposalId;

    #[test]
    fn client_errors_map_to_4xx() {
        let id = ProposalId::new([1; 32]);
        let cases = [
            (RpcError::from(GovernanceError::ProposalNotFound(id)), StatusCode::NOT_FOUND),
            (
                RpcError::from(GovernanceError::InvalidChoice("maybe".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                RpcError::from(GovernanceError::Validation(vec![])),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (RpcError::MissingIdentity, StatusCode::UNAUTHORIZED),
            (RpcError::NotGuardian("eve".into()), StatusCode::FORBIDDEN),
            (RpcError::from(ConstiError::AlreadyImplemented(id)), StatusCode::CONFLICT),
        ];
        for (err, status) in cases {
            assert_eq!(err.classify().0, status, "{err}");
        }
    }

    #[test]
    fn contention_is_service_unavailable() {
        let err = RpcError::from(GovernanceError::Contended(ProposalId::new([1; 32])));
        assert_eq!(err.classify(), (StatusCode::SERVICE_UNAVAILABLE, "contended"));
    }

    #[test]
    fn duplicate_implement_is_reported_generically() {
        let err = RpcError::from(ConstiError::AlreadyImplemented(ProposalId::new([1; 32])));
        assert!(!err.public_message().contains("implemented"));
    }
}
