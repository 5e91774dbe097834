//! Axum-based RPC server.

use std::net::SocketAddr;

use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::RpcError;
use crate::handlers;
use crate::pagination::NEXT_CURSOR_HEADER;
use crate::state::{SharedState, USER_HEADER};

pub struct RpcServer {
    pub addr: SocketAddr,
    pub state: SharedState,
    /// Browser origins allowed to call the API. Empty disables CORS.
    pub cors_origins: Vec<String>,
}

impl RpcServer {
    pub fn new(addr: SocketAddr, state: SharedState, cors_origins: Vec<String>) -> Self {
        Self {
            addr,
            state,
            cors_origins,
        }
    }

    /// The full route table with middleware applied.
    pub fn router(&self) -> Router {
        let router = routes(self.state.clone()).layer(TraceLayer::new_for_http());
        match cors_layer(&self.cors_origins) {
            Some(cors) => router.layer(cors),
            None => router,
        }
    }

    /// Bind and serve until `shutdown` fires.
    pub async fn serve(&self, mut shutdown: broadcast::Receiver<()>) -> Result<(), RpcError> {
        let listener = TcpListener::bind(self.addr)
            .await
            .map_err(|e| RpcError::Server(format!("bind {}: {e}", self.addr)))?;
        tracing::info!(addr = %self.addr, "RPC server listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("RPC server draining");
            })
            .await
            .map_err(|e| RpcError::Server(e.to_string()))
    }
}

/// Routes without middleware, used directly by tests.
pub fn routes(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .route(
            "/api/evolution/proposals",
            get(handlers::list_proposals).post(handlers::submit_draft),
        )
        .route("/api/evolution/proposals/:id", get(handlers::get_proposal))
        .route("/api/evolution/proposals/:id/votes", get(handlers::list_votes))
        .route("/api/evolution/proposals/:id/vote", post(handlers::cast_vote))
        .route("/api/governance/proposals/:id/admit", post(handlers::admit))
        .route("/api/governance/proposals/:id/veto", post(handlers::veto))
        .route("/api/governance/proposals/:id/resolve", post(handlers::resolve))
        .route(
            "/api/governance/proposals/:id/implement",
            post(handlers::implement),
        )
        .route("/api/governance/amendments", get(handlers::amendments))
        .route("/api/governance/constitution", get(handlers::constitution))
        .route(
            "/api/governance/integrity/reports",
            get(handlers::integrity_reports),
        )
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    if origins.is_empty() {
        return None;
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "ignoring unparseable CORS origin");
                None
            }
        })
        .collect();
    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(USER_HEADER)])
            .expose_headers([HeaderName::from_static(NEXT_CURSOR_HEADER)]),
    )
}
