//! Wires storage, governance, the HTTP API and the deadline resolver into
//! one running node.

use std::sync::Arc;
use std::time::Duration;

use mirror_consti::AmendmentPublisher;
use mirror_governance::{
    DisabledIntegrityScorer, IntegrityScorer, ProposalLifecycle, VotingEngine,
};
use mirror_rpc::{AppState, GovernanceMetrics, GuardianPolicy, RpcServer, SharedState};
use mirror_store_lmdb::LmdbEnvironment;
use mirror_types::{Clock, SystemClock};

use crate::config::MirrorConfig;
use crate::integrity_client::HttpIntegrityScorer;
use crate::resolver::DeadlineResolver;
use crate::shutdown::ShutdownController;
use crate::NodeError;

pub struct MirrorNode {
    config: MirrorConfig,
    env: LmdbEnvironment,
    state: SharedState,
    resolver: Arc<DeadlineResolver>,
    shutdown: Arc<ShutdownController>,
}

impl MirrorNode {
    /// Open storage and build every component, reading time from the system clock.
    pub fn new(config: MirrorConfig) -> Result<Self, NodeError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: MirrorConfig, clock: Arc<dyn Clock>) -> Result<Self, NodeError> {
        config.validate()?;
        let env = LmdbEnvironment::open(&config.data_dir, config.map_size)?;
        let store = Arc::new(env.governance_store());

        let lifecycle = Arc::new(ProposalLifecycle::new(
            store.clone(),
            clock.clone(),
            config.governance.clone(),
        ));
        let engine = Arc::new(VotingEngine::new(lifecycle.clone()));
        let publisher = Arc::new(AmendmentPublisher::new(store, clock, &config.governance));
        let integrity = integrity_scorer(&config)?;
        let metrics = Arc::new(GovernanceMetrics::new()?);

        let guardians = GuardianPolicy::new(config.guardians.iter().cloned());
        if guardians.is_open() {
            tracing::warn!("no guardians configured, any caller may admit, veto and implement");
        }

        let resolver = Arc::new(DeadlineResolver::new(
            lifecycle,
            metrics.clone(),
            Duration::from_secs(config.resolver_interval_secs),
        ));
        let state = Arc::new(AppState {
            engine,
            publisher,
            integrity,
            guardians,
            metrics,
        });

        Ok(Self {
            config,
            env,
            state,
            resolver,
            shutdown: Arc::new(ShutdownController::new()),
        })
    }

    pub fn config(&self) -> &MirrorConfig {
        &self.config
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    /// Trigger to stop [`MirrorNode::run`] programmatically.
    pub fn shutdown_handle(&self) -> Arc<ShutdownController> {
        self.shutdown.clone()
    }

    /// Serve the API and resolve deadlines until SIGINT, SIGTERM or a
    /// programmatic shutdown. Flushes storage before returning.
    pub async fn run(&self) -> Result<(), NodeError> {
        let signals = self.shutdown.clone();
        let signal_handle = tokio::spawn(async move { signals.wait_for_signal().await });

        let resolver_handle = tokio::spawn(self.resolver.clone().run(self.shutdown.subscribe()));

        let server = RpcServer::new(
            self.config.rpc_addr(),
            self.state.clone(),
            self.config.cors_origins.clone(),
        );
        let served = server.serve(self.shutdown.subscribe()).await;

        // The server may have failed on its own; make sure the resolver stops too.
        self.shutdown.shutdown();
        if let Err(e) = resolver_handle.await {
            tracing::error!(error = %e, "deadline resolver task failed");
        }
        signal_handle.abort();

        self.env.sync()?;
        tracing::info!("storage flushed");
        served?;
        Ok(())
    }
}

fn integrity_scorer(config: &MirrorConfig) -> Result<Arc<dyn IntegrityScorer>, NodeError> {
    match config.integrity_url.as_deref() {
        Some(url) => {
            tracing::info!(url, "integrity scoring enabled");
            Ok(Arc::new(HttpIntegrityScorer::new(
                url,
                Duration::from_secs(config.integrity_timeout_secs),
            )?))
        }
        None => {
            tracing::info!("integrity scoring disabled");
            Ok(Arc::new(DisabledIntegrityScorer))
        }
    }
}
