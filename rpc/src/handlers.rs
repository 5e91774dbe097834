//! HTTP request handlers.
//!
//! Governance calls are synchronous storage transactions, so they run on the
//! blocking pool rather than on the async workers.

use std::time::Instant;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use mirror_consti::{Amendment, ConstitutionDocument};
use mirror_governance::{
    IntegrityReport, Proposal, ProposalDraft, ProposalStatus, Vote, VoteChoice, VoteReceipt,
    VoteTally,
};
use mirror_types::{ProposalId, Timestamp};
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;

use crate::error::RpcError;
use crate::extract::{optional_json, ApiJson};
use crate::pagination::{PaginationParams, NEXT_CURSOR_HEADER};
use crate::state::{caller, SharedState};
use crate::tracing_spans::{implement_span, resolve_span, rpc_span, vote_span};

// ── Requests ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListProposalsQuery {
    pub status: Option<String>,
    pub cursor: Option<String>,
    pub count: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct CastVoteRequest {
    /// `approve`, `reject` or `abstain`.
    pub vote: String,
    pub reasoning: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmitRequest {
    pub voting_deadline: Option<Timestamp>,
}

#[derive(Debug, Deserialize)]
pub struct VetoRequest {
    pub reason: String,
}

// ── Responses ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VotesResponse {
    pub proposal_id: ProposalId,
    pub tally: VoteTally,
    pub votes: Vec<Vote>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveResponse {
    pub proposal_id: ProposalId,
    pub status: ProposalStatus,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

// ── Handlers ─────────────────────────────────────────────────────────────

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET /metrics
pub async fn metrics(State(state): State<SharedState>) -> Result<Response, RpcError> {
    let body = state
        .metrics
        .encode()
        .map_err(|e| RpcError::Server(e.to_string()))?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response())
}

/// GET /api/evolution/proposals
pub async fn list_proposals(
    State(state): State<SharedState>,
    Query(query): Query<ListProposalsQuery>,
) -> Result<Response, RpcError> {
    let status = query
        .status
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(str::parse::<ProposalStatus>)
        .transpose()
        .map_err(RpcError::InvalidRequest)?;
    let paging = PaginationParams {
        cursor: query.cursor,
        count: query.count,
    };

    let proposals = blocking(move || Ok(state.lifecycle().list(status)?)).await?;
    let (page, next) = paging
        .page(proposals)
        .ok_or_else(|| RpcError::InvalidRequest("malformed cursor".into()))?;

    let mut response = Json(page).into_response();
    if let Some(cursor) = next.and_then(|c| HeaderValue::from_str(&c).ok()) {
        response.headers_mut().insert(NEXT_CURSOR_HEADER, cursor);
    }
    Ok(response)
}

/// POST /api/evolution/proposals
pub async fn submit_draft(
    State(state): State<SharedState>,
    headers: HeaderMap,
    ApiJson(draft): ApiJson<ProposalDraft>,
) -> Result<(StatusCode, Json<Proposal>), RpcError> {
    let proposer = caller(&headers)?;
    let span = rpc_span("submit_draft");
    let proposal = blocking(move || {
        let _guard = span.enter();
        let proposal = state.lifecycle().submit_draft(&proposer, draft)?;
        state.metrics.proposals_submitted.inc();
        Ok(proposal)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(proposal)))
}

/// GET /api/evolution/proposals/{id}
pub async fn get_proposal(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Proposal>, RpcError> {
    let id = parse_id(&id)?;
    let proposal = blocking(move || Ok(state.lifecycle().get(&id)?)).await?;
    Ok(Json(proposal))
}

/// GET /api/evolution/proposals/{id}/votes
pub async fn list_votes(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<VotesResponse>, RpcError> {
    let id = parse_id(&id)?;
    let response = blocking(move || {
        let votes = state.engine.votes(&id)?;
        let tally = votes.iter().collect();
        Ok(VotesResponse {
            proposal_id: id,
            tally,
            votes,
        })
    })
    .await?;
    Ok(Json(response))
}

/// POST /api/evolution/proposals/{id}/vote
pub async fn cast_vote(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<CastVoteRequest>,
) -> Result<Json<VoteReceipt>, RpcError> {
    let id = parse_id(&id)?;
    let voter = caller(&headers)?;
    let span = vote_span(&id.to_string(), voter.as_str());

    let metrics = state.metrics.clone();
    let started = Instant::now();
    let result = blocking(move || {
        let _guard = span.enter();
        let choice: VoteChoice = request.vote.parse()?;
        Ok(state
            .engine
            .cast_vote(&id, &voter, choice, request.reasoning)?)
    })
    .await;
    metrics
        .vote_latency_ms
        .observe(started.elapsed().as_secs_f64() * 1000.0);

    match result {
        Ok(receipt) => {
            metrics
                .votes_cast
                .with_label_values(&[receipt.choice.as_str()])
                .inc();
            if receipt.status == ProposalStatus::Passed {
                metrics.proposals_resolved.with_label_values(&["passed"]).inc();
            }
            Ok(Json(receipt))
        }
        Err(e) => {
            metrics.votes_refused.with_label_values(&[e.classify().1]).inc();
            Err(e)
        }
    }
}

/// POST /api/governance/proposals/{id}/admit
pub async fn admit(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Proposal>, RpcError> {
    let id = parse_id(&id)?;
    let guardian = caller(&headers)?;
    state.guardians.authorize(&guardian)?;
    let deadline = optional_json::<AdmitRequest>(&body)?.voting_deadline;
    let span = rpc_span("admit");
    let proposal = blocking(move || {
        let _guard = span.enter();
        Ok(state.lifecycle().admit_to_voting(&id, &guardian, deadline)?)
    })
    .await?;
    Ok(Json(proposal))
}

/// POST /api/governance/proposals/{id}/veto
pub async fn veto(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<VetoRequest>,
) -> Result<Json<Proposal>, RpcError> {
    let id = parse_id(&id)?;
    let guardian = caller(&headers)?;
    state.guardians.authorize(&guardian)?;
    let span = rpc_span("veto");
    let proposal = blocking(move || {
        let _guard = span.enter();
        let proposal = state.lifecycle().veto(&id, &guardian, &request.reason)?;
        state.metrics.proposals_resolved.with_label_values(&["vetoed"]).inc();
        Ok(proposal)
    })
    .await?;
    Ok(Json(proposal))
}

/// POST /api/governance/proposals/{id}/resolve
pub async fn resolve(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<ResolveResponse>, RpcError> {
    let id = parse_id(&id)?;
    let span = resolve_span(&id.to_string());
    let status = blocking(move || {
        let _guard = span.enter();
        let before = state.lifecycle().get(&id)?.status;
        let status = state.lifecycle().resolve(&id)?;
        if before == ProposalStatus::Voting && status != before {
            state
                .metrics
                .proposals_resolved
                .with_label_values(&[status.as_str()])
                .inc();
        }
        Ok(status)
    })
    .await?;
    Ok(Json(ResolveResponse {
        proposal_id: id,
        status,
    }))
}

/// POST /api/governance/proposals/{id}/implement
pub async fn implement(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<Amendment>), RpcError> {
    let id = parse_id(&id)?;
    let guardian = caller(&headers)?;
    state.guardians.authorize(&guardian)?;
    let span = implement_span(&id.to_string());
    let amendment = blocking(move || {
        let _guard = span.enter();
        let amendment = state.publisher.implement(&id)?;
        state.metrics.amendments_implemented.inc();
        tracing::info!(guardian = %guardian, number = amendment.number, "implemented by guardian");
        Ok(amendment)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(amendment)))
}

/// GET /api/governance/amendments
pub async fn amendments(State(state): State<SharedState>) -> Result<Json<Vec<Amendment>>, RpcError> {
    let history = blocking(move || Ok(state.publisher.history()?)).await?;
    Ok(Json(history))
}

/// GET /api/governance/constitution
pub async fn constitution(
    State(state): State<SharedState>,
) -> Result<Json<ConstitutionDocument>, RpcError> {
    let document = blocking(move || Ok(state.publisher.constitution()?)).await?;
    Ok(Json(document))
}

/// GET /api/governance/integrity/reports
///
/// One report per proposal currently in voting, scored concurrently and
/// returned in proposal order. A proposal the scorer fails on is logged and
/// left out.
pub async fn integrity_reports(
    State(state): State<SharedState>,
) -> Result<Json<Vec<IntegrityReport>>, RpcError> {
    if !state.integrity.is_enabled() {
        return Ok(Json(Vec::new()));
    }
    let lookup = state.clone();
    let voting = blocking(move || {
        Ok(lookup.lifecycle().list(Some(ProposalStatus::Voting))?)
    })
    .await?;

    let mut scoring = JoinSet::new();
    for (index, id) in voting.iter().map(|p| p.id).enumerate() {
        let scorer = state.integrity.clone();
        scoring.spawn(async move { (index, id, scorer.score(&id).await) });
    }

    let mut reports = Vec::with_capacity(scoring.len());
    while let Some(joined) = scoring.join_next().await {
        let (index, id, result) =
            joined.map_err(|e| RpcError::Server(format!("scoring task failed: {e}")))?;
        match result {
            Ok(report) => reports.push((index, report)),
            Err(e) => {
                tracing::warn!(proposal = %id, error = %e, "integrity scoring failed, skipping")
            }
        }
    }
    reports.sort_by_key(|(index, _)| *index);
    Ok(Json(reports.into_iter().map(|(_, report)| report).collect()))
}

// ── Helpers ──────────────────────────────────────────────────────────────

fn parse_id(raw: &str) -> Result<ProposalId, RpcError> {
    raw.parse()
        .map_err(|_| RpcError::InvalidProposalId(raw.to_string()))
}

async fn blocking<T, F>(f: F) -> Result<T, RpcError>
where
    F: FnOnce() -> Result<T, RpcError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| RpcError::Server(format!("worker task failed: {e}")))?
}
