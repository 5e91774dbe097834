//! HTTP client for the external integrity service.

use std::time::Duration;

use async_trait::async_trait;
use mirror_governance::{IntegrityError, IntegrityReport, IntegrityScorer, IntegrityThreat};
use mirror_types::ProposalId;
use serde::Deserialize;

use crate::NodeError;

/// Wire shape returned by `GET {base}/proposals/{id}/integrity`.
#[derive(Debug, Deserialize)]
struct ScoreResponse {
    score: f64,
    #[serde(default)]
    threats: Vec<IntegrityThreat>,
}

/// Scores proposals by asking the integrity service over HTTP.
pub struct HttpIntegrityScorer {
    /// Base URL without a trailing slash.
    base_url: String,
    client: reqwest::Client,
}

impl HttpIntegrityScorer {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, NodeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NodeError::Integrity(e.to_string()))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn report_url(&self, proposal: &ProposalId) -> String {
        format!("{}/proposals/{proposal}/integrity", self.base_url)
    }
}

#[async_trait]
impl IntegrityScorer for HttpIntegrityScorer {
    async fn score(&self, proposal: &ProposalId) -> Result<IntegrityReport, IntegrityError> {
        let url = self.report_url(proposal);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| IntegrityError::Unavailable(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(IntegrityError::Unavailable(format!(
                "HTTP {} from {}",
                resp.status(),
                url
            )));
        }

        let body: ScoreResponse = resp
            .json()
            .await
            .map_err(|e| IntegrityError::InvalidResponse(e.to_string()))?;
        tracing::debug!(proposal = %proposal, score = body.score, threats = body.threats.len(), "integrity scored");
        Ok(IntegrityReport::new(*proposal, body.score, body.threats))
    }
}
