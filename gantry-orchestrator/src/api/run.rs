//! Run API Handlers
//!
//! HTTP endpoints for starting and inspecting pipeline runs.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use gantry_core::dto::run::{RunDetails, RunSummary, StartLuaRun, StartRun};
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::state::AppState;

/// POST /api/runs
/// Start a run from a JSON pipeline definition
pub async fn start_run(
    State(state): State<AppState>,
    Json(req): Json<StartRun>,
) -> ApiResult<(StatusCode, Json<RunSummary>)> {
    tracing::info!("Starting run of pipeline '{}'", req.pipeline.name);

    let summary = state.runs.start(&state.engine, req.pipeline)?;

    Ok((StatusCode::CREATED, Json(summary)))
}

/// POST /api/runs/lua
/// Start a run from a Lua pipeline definition
pub async fn start_lua_run(
    State(state): State<AppState>,
    Json(req): Json<StartLuaRun>,
) -> ApiResult<(StatusCode, Json<RunSummary>)> {
    if req.script.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Pipeline script cannot be empty".to_string(),
        ));
    }

    let pipeline = gantry_lua::parse_pipeline(&req.script)
        .map_err(|e| ApiError::BadRequest(format!("{:#}", e)))?;

    tracing::info!("Starting run of Lua pipeline '{}'", pipeline.name);

    let summary = state.runs.start(&state.engine, pipeline)?;

    Ok((StatusCode::CREATED, Json(summary)))
}

/// GET /api/runs
pub async fn list_runs(State(state): State<AppState>) -> Json<Vec<RunSummary>> {
    tracing::debug!("Listing runs");
    Json(state.runs.list())
}

/// GET /api/runs/{id}
pub async fn get_run(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<RunDetails>> {
    tracing::debug!("Getting run: {}", id);

    state
        .runs
        .get(id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Run {} not found", id)))
}
