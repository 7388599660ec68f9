//! Lifecycle Hook API Handlers

use axum::{Json, extract::State};
use gantry_core::domain::canary::{CanaryReport, LifecycleEvent};
use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::state::AppState;

/// POST /api/hooks/pre-traffic
/// Run the canary check for a deployment and report its verdict
///
/// The check runs in its own task: once started it reports a verdict to
/// the deployment controller even if the caller disconnects.
pub async fn pre_traffic(
    State(state): State<AppState>,
    Json(event): Json<LifecycleEvent>,
) -> ApiResult<Json<CanaryReport>> {
    tracing::info!(
        "Pre-traffic hook for deployment {} (execution {})",
        event.deployment_id,
        event.hook_execution_id
    );

    let hook = Arc::clone(&state.hook);
    let report = tokio::spawn(async move { hook.handle(event).await })
        .await
        .map_err(|e| ApiError::InternalError(format!("Pre-traffic hook task failed: {}", e)))??;

    Ok(Json(report))
}
