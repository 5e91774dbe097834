//! Tunable governance parameters.
//!
//! Percentages are basis points (10_000 = 100%). Loaded from the node's TOML
//! configuration under `[governance]`; every field has a default.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernanceParams {
    /// Approval share (of approve + reject) a supermajority proposal must reach, inclusive.
    pub supermajority_bps: u32,

    /// Approval share an ordinary proposal must strictly exceed.
    pub simple_majority_bps: u32,

    /// Decisive (approve + reject) votes required before a supermajority
    /// proposal may pass ahead of its deadline.
    pub early_resolution_quorum: u64,

    /// Voting window used when a guardian admits a proposal without a deadline.
    pub default_voting_period_secs: u64,

    /// Shortest voting window a guardian may grant.
    pub min_voting_period_secs: u64,

    /// Optimistic-concurrency attempts per write before giving up with `Contended`.
    pub max_write_attempts: u32,

    pub title_min_len: usize,
    pub description_min_len: usize,
    pub full_text_min_len: usize,
    pub rationale_min_len: usize,

    /// Longest accepted vote comment, in characters.
    pub comment_max_len: usize,
}

impl Default for GovernanceParams {
    fn default() -> Self {
        Self {
            supermajority_bps: 6_600,
            simple_majority_bps: 5_000,
            early_resolution_quorum: 10,
            default_voting_period_secs: 7 * 24 * 3600,
            min_voting_period_secs: 3600,
            max_write_attempts: 16,
            title_min_len: 10,
            description_min_len: 20,
            full_text_min_len: 100,
            rationale_min_len: 50,
            comment_max_len: 2_000,
        }
    }
}

impl GovernanceParams {
    /// Short voting windows and a small early quorum, for local development.
    /// Thresholds and limits are left as they are.
    pub fn with_dev_windows(self) -> Self {
        Self {
            early_resolution_quorum: 3,
            default_voting_period_secs: 600,
            min_voting_period_secs: 60,
            ..self
        }
    }
}
