//! Periodic resolution of proposals whose voting deadline has passed.

use std::sync::Arc;
use std::time::Duration;

use mirror_governance::{GovernanceError, ProposalLifecycle, ProposalStatus};
use mirror_rpc::tracing_spans::resolve_span;
use mirror_rpc::GovernanceMetrics;
use mirror_types::ProposalId;
use tokio::sync::broadcast;

pub struct DeadlineResolver {
    lifecycle: Arc<ProposalLifecycle>,
    metrics: Arc<GovernanceMetrics>,
    interval: Duration,
}

impl DeadlineResolver {
    pub fn new(
        lifecycle: Arc<ProposalLifecycle>,
        metrics: Arc<GovernanceMetrics>,
        interval: Duration,
    ) -> Self {
        Self {
            lifecycle,
            metrics,
            interval,
        }
    }

    /// Resolve every expired proposal once. Blocking.
    pub fn sweep(&self) -> Result<Vec<(ProposalId, ProposalStatus)>, GovernanceError> {
        let _guard = resolve_span("expired").entered();
        let resolved = self.lifecycle.resolve_expired()?;
        for (id, status) in &resolved {
            self.metrics
                .proposals_resolved
                .with_label_values(&[status.as_str()])
                .inc();
            tracing::info!(proposal = %id, outcome = %status, "voting closed at deadline");
        }
        Ok(resolved)
    }

    /// Sweep on every tick until `shutdown` fires. A failed sweep is retried
    /// on the next tick.
    pub async fn run(self: Arc<Self>, mut shutdown: broadcast::Receiver<()>) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        tracing::info!(every_secs = self.interval.as_secs_f64(), "deadline resolver started");

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("deadline resolver stopping");
                    break;
                }
                _ = interval.tick() => {
                    let this = self.clone();
                    match tokio::task::spawn_blocking(move || this.sweep()).await {
                        Ok(Ok(_)) => {}
                        Ok(Err(e)) => tracing::warn!(error = %e, "deadline sweep failed"),
                        Err(e) => tracing::error!(error = %e, "deadline sweep task panicked"),
                    }
                }
            }
        }
    }
}
