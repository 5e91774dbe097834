//! Prometheus metrics for the governance backend.
//!
//! [`GovernanceMetrics`] owns a dedicated [`Registry`] that the `/metrics`
//! endpoint encodes into the Prometheus text exposition format.

use prometheus::{
    register_histogram_with_registry, register_int_counter_vec_with_registry,
    register_int_counter_with_registry, Encoder, Histogram, HistogramOpts, IntCounter,
    IntCounterVec, Opts, Registry, TextEncoder,
};

pub struct GovernanceMetrics {
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    pub proposals_submitted: IntCounter,
    /// Accepted votes, labelled by choice.
    pub votes_cast: IntCounterVec,
    /// Refused votes, labelled by error code.
    pub votes_refused: IntCounterVec,
    /// Settled proposals, labelled by outcome.
    pub proposals_resolved: IntCounterVec,
    pub amendments_implemented: IntCounter,

    // ── Histograms ──────────────────────────────────────────────────────
    /// Wall time of a vote cast including retries, in milliseconds.
    pub vote_latency_ms: Histogram,
}

impl GovernanceMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let proposals_submitted = register_int_counter_with_registry!(
            Opts::new(
                "mirror_proposals_submitted_total",
                "Total proposal drafts accepted"
            ),
            registry
        )?;
        let votes_cast = register_int_counter_vec_with_registry!(
            Opts::new("mirror_votes_cast_total", "Total votes committed"),
            &["choice"],
            registry
        )?;
        let votes_refused = register_int_counter_vec_with_registry!(
            Opts::new("mirror_votes_refused_total", "Total vote casts refused"),
            &["reason"],
            registry
        )?;
        let proposals_resolved = register_int_counter_vec_with_registry!(
            Opts::new(
                "mirror_proposals_resolved_total",
                "Total proposals settled by vote or veto"
            ),
            &["outcome"],
            registry
        )?;
        let amendments_implemented = register_int_counter_with_registry!(
            Opts::new(
                "mirror_amendments_implemented_total",
                "Total amendments appended to the constitution"
            ),
            registry
        )?;

        // 0.1 ms → ~1.6 s.
        let vote_latency_ms = register_histogram_with_registry!(
            HistogramOpts::new("mirror_vote_latency_ms", "Vote cast latency in milliseconds")
                .buckets(prometheus::exponential_buckets(0.1, 2.0, 15)?),
            registry
        )?;

        Ok(Self {
            registry,
            proposals_submitted,
            votes_cast,
            votes_refused,
            proposals_resolved,
            amendments_implemented,
            vote_latency_ms,
        })
    }

    /// Render every metric in the text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
