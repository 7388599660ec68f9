//! Approval API Handlers
//!
//! The external approval channel: reviewers list pending requests and
//! approve or reject them.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use gantry_core::domain::approval::{ApprovalRequest, ApprovalState};
use gantry_core::dto::approval::ResolveApproval;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ApprovalQuery {
    pub state: Option<ApprovalState>,
}

/// GET /api/approvals[?state=pending|approved|rejected]
pub async fn list_approvals(
    State(state): State<AppState>,
    Query(query): Query<ApprovalQuery>,
) -> Json<Vec<ApprovalRequest>> {
    tracing::debug!("Listing approvals (state: {:?})", query.state);
    Json(state.engine.approvals().list(query.state))
}

/// GET /api/approvals/{id}
pub async fn get_approval(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApprovalRequest>> {
    state
        .engine
        .approvals()
        .get(id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Approval {} not found", id)))
}

/// POST /api/approvals/{id}/resolve
pub async fn resolve_approval(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ResolveApproval>,
) -> ApiResult<Json<ApprovalRequest>> {
    tracing::info!(
        "Resolving approval {} ({:?} by {})",
        id,
        req.decision,
        req.resolved_by.as_deref().unwrap_or("anonymous")
    );

    let request = state
        .engine
        .approvals()
        .resolve(id, req.decision, req.resolved_by, req.comment)?;

    Ok(Json(request))
}
