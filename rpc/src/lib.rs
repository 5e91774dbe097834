//! HTTP API for The Mirror governance backend.
//!
//! Provides endpoints for:
//! - Proposal composition, listing and reads
//! - Vote casting and per-proposal vote audit
//! - Guardian actions (admit, veto, implement) and resolution
//! - Amendment history and the current constitution
//! - Integrity reports for proposals in voting
//! - Health and Prometheus metrics

pub mod error;
pub mod extract;
pub mod handlers;
pub mod metrics;
pub mod pagination;
pub mod server;
pub mod state;
pub mod tracing_spans;

pub use error::RpcError;
pub use extract::ApiJson;
pub use metrics::GovernanceMetrics;
pub use server::RpcServer;
pub use state::{AppState, GuardianPolicy, SharedState, USER_HEADER};
