//! Pre-built [`tracing::Span`] constructors for governance operations.

use tracing::{info_span, Span};

/// Span covering a single HTTP action.
pub fn rpc_span(action: &str) -> Span {
    info_span!("rpc", action = %action)
}

/// Span covering one vote cast, retries included.
pub fn vote_span(proposal: &str, voter: &str) -> Span {
    info_span!("vote", proposal = %proposal, voter = %voter)
}

/// Span covering the resolution of one proposal or a sweep of expired ones.
pub fn resolve_span(scope: &str) -> Span {
    info_span!("resolve", scope = %scope)
}

/// Span covering the implementation of a passed proposal.
pub fn implement_span(proposal: &str) -> Span {
    info_span!("implement", proposal = %proposal)
}
