//! Nullable integrity scorer: scripted reports for testing.

use async_trait::async_trait;
use mirror_governance::{IntegrityError, IntegrityReport, IntegrityScorer, IntegrityThreat};
use mirror_types::ProposalId;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

enum Scripted {
    Report(f64, Vec<IntegrityThreat>),
    Unavailable(String),
}

/// Returns whatever was scripted per proposal. Unscripted proposals score a
/// clean 1.0 with no threats.
#[derive(Default)]
pub struct NullIntegrityScorer {
    scripted: Mutex<HashMap<ProposalId, Scripted>>,
    calls: Mutex<Vec<ProposalId>>,
}

impl NullIntegrityScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_report(&self, proposal: ProposalId, score: f64, threats: Vec<IntegrityThreat>) {
        lock(&self.scripted).insert(proposal, Scripted::Report(score, threats));
    }

    /// Make scoring this proposal fail as if the service were down.
    pub fn set_unavailable(&self, proposal: ProposalId, message: impl Into<String>) {
        lock(&self.scripted).insert(proposal, Scripted::Unavailable(message.into()));
    }

    /// Proposals scored so far, in call order.
    pub fn calls(&self) -> Vec<ProposalId> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl IntegrityScorer for NullIntegrityScorer {
    async fn score(&self, proposal: &ProposalId) -> Result<IntegrityReport, IntegrityError> {
        lock(&self.calls).push(*proposal);
        match lock(&self.scripted).get(proposal) {
            Some(Scripted::Report(score, threats)) => {
                Ok(IntegrityReport::new(*proposal, *score, threats.clone()))
            }
            Some(Scripted::Unavailable(message)) => {
                Err(IntegrityError::Unavailable(message.clone()))
            }
            None => Ok(IntegrityReport::new(*proposal, 1.0, Vec::new())),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
