//! Shared handler state and caller identification.

use std::collections::HashSet;
use std::sync::Arc;

use axum::http::HeaderMap;
use mirror_consti::AmendmentPublisher;
use mirror_governance::{IntegrityScorer, ProposalLifecycle, VotingEngine};
use mirror_types::UserId;

use crate::error::RpcError;
use crate::metrics::GovernanceMetrics;

/// Header carrying the authenticated caller, set by the upstream gateway.
pub const USER_HEADER: &str = "x-mirror-user";

/// Who may act as a guardian.
#[derive(Clone, Debug, Default)]
pub struct GuardianPolicy {
    guardians: HashSet<UserId>,
}

impl GuardianPolicy {
    pub fn new(guardians: impl IntoIterator<Item = UserId>) -> Self {
        Self {
            guardians: guardians.into_iter().collect(),
        }
    }

    /// Development mode: with no guardians configured anyone may act as one.
    pub fn is_open(&self) -> bool {
        self.guardians.is_empty()
    }

    pub fn authorize(&self, caller: &UserId) -> Result<(), RpcError> {
        if self.is_open() || self.guardians.contains(caller) {
            Ok(())
        } else {
            Err(RpcError::NotGuardian(caller.to_string()))
        }
    }
}

pub struct AppState {
    pub engine: Arc<VotingEngine>,
    pub publisher: Arc<AmendmentPublisher>,
    pub integrity: Arc<dyn IntegrityScorer>,
    pub guardians: GuardianPolicy,
    pub metrics: Arc<GovernanceMetrics>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn lifecycle(&self) -> &Arc<ProposalLifecycle> {
        self.engine.lifecycle()
    }
}

/// The caller named by the identity header.
pub fn caller(headers: &HeaderMap) -> Result<UserId, RpcError> {
    let raw = headers
        .get(USER_HEADER)
        .ok_or(RpcError::MissingIdentity)?
        .to_str()
        .map_err(|_| RpcError::InvalidIdentity("header is not valid ASCII".into()))?;
    UserId::parse(raw.trim()).map_err(|e| RpcError::InvalidIdentity(e.to_string()))
}
