//! Run DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::pipeline::Pipeline;
use crate::domain::run::{ExecutionRecord, RunStatus, StageFailure};

/// Request to start a run from a pipeline definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartRun {
    pub pipeline: Pipeline,
}

/// Request to start a run from a Lua pipeline definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartLuaRun {
    pub script: String,
}

/// Run summary for listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub id: Uuid,
    pub pipeline: String,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub failure: Option<StageFailure>,
}

/// Run summary plus the execution history recorded so far
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunDetails {
    #[serde(flatten)]
    pub summary: RunSummary,
    pub history: Vec<ExecutionRecord>,
}
