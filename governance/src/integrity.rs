//! Integrity scoring interface.
//!
//! Sybil, bot and coordinated-voting detection run in a separate service.
//! This crate only defines the report shape and the seam it is reached
//! through; the node supplies an HTTP client and tests supply a scripted one.

use async_trait::async_trait;
use mirror_types::ProposalId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreatSeverity {
    Low,
    Medium,
    High,
    Critical,
}

/// One suspected threat against a proposal's vote.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntegrityThreat {
    #[serde(rename = "type")]
    pub kind: String,
    pub severity: ThreatSeverity,
    pub description: String,
}

/// Integrity assessment of a single proposal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityReport {
    pub proposal_id: ProposalId,
    /// 0.0 (compromised) to 1.0 (clean).
    pub score: f64,
    pub threats: Vec<IntegrityThreat>,
}

impl IntegrityReport {
    /// Build a report, clamping the score into `0.0..=1.0`. NaN becomes 0.
    pub fn new(proposal_id: ProposalId, score: f64, threats: Vec<IntegrityThreat>) -> Self {
        let score = if score.is_nan() { 0.0 } else { score.clamp(0.0, 1.0) };
        Self {
            proposal_id,
            score,
            threats,
        }
    }

    pub fn highest_severity(&self) -> Option<ThreatSeverity> {
        self.threats.iter().map(|t| t.severity).max()
    }
}

#[derive(Debug, Error)]
pub enum IntegrityError {
    #[error("integrity scoring is not configured")]
    Disabled,

    #[error("integrity service unavailable: {0}")]
    Unavailable(String),

    #[error("integrity service returned an invalid response: {0}")]
    InvalidResponse(String),
}

/// Source of integrity reports.
#[async_trait]
pub trait IntegrityScorer: Send + Sync {
    async fn score(&self, proposal: &ProposalId) -> Result<IntegrityReport, IntegrityError>;

    /// False when no scoring service is configured.
    fn is_enabled(&self) -> bool {
        true
    }
}

/// Scorer used when no integrity service is configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct DisabledIntegrityScorer;

#[async_trait]
impl IntegrityScorer for DisabledIntegrityScorer {
    async fn score(&self, _proposal: &ProposalId) -> Result<IntegrityReport, IntegrityError> {
        Err(IntegrityError::Disabled)
    }

    fn is_enabled(&self) -> bool {
        false
    }
}
