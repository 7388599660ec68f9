//! Run domain types
//!
//! A run is one execution of a pipeline. It records every action it started
//! and the final outcome; it carries no state into the next run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Run status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Running,
    Succeeded,
    Failed,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Running => write!(f, "Running"),
            RunStatus::Succeeded => write!(f, "Succeeded"),
            RunStatus::Failed => write!(f, "Failed"),
        }
    }
}

/// Why an action failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    /// The executor returned a failure
    ActionFailure,
    /// A variable reference or input artifact was not available
    ResolutionError,
    /// A reviewer rejected the approval
    ApprovalRejected,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::ActionFailure => write!(f, "ActionFailure"),
            FailureKind::ResolutionError => write!(f, "ResolutionError"),
            FailureKind::ApprovalRejected => write!(f, "ApprovalRejected"),
        }
    }
}

/// Terminal outcome of one action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum ActionOutcome {
    Succeeded,
    Failed { kind: FailureKind, message: String },
    /// Finished after a sibling in its run-order group failed; outputs dropped
    Discarded,
}

impl ActionOutcome {
    pub fn failed(kind: FailureKind, message: impl Into<String>) -> Self {
        ActionOutcome::Failed {
            kind,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ActionOutcome::Succeeded)
    }
}

/// Execution history entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub stage: String,
    pub action: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub outcome: ActionOutcome,
}

/// The stage and action that halted a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageFailure {
    pub stage: String,
    pub action: String,
    pub kind: FailureKind,
    pub message: String,
}

impl fmt::Display for StageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "stage '{}' failed at action '{}' ({}): {}",
            self.stage, self.action, self.kind, self.message
        )
    }
}

/// Final result of a pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub run_id: Uuid,
    pub pipeline: String,
    pub status: RunStatus,
    pub failure: Option<StageFailure>,
    pub history: Vec<ExecutionRecord>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl PipelineResult {
    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Succeeded
    }

    pub fn failed_stage(&self) -> Option<&str> {
        self.failure.as_ref().map(|f| f.stage.as_str())
    }

    /// Whether any action of the named stage was started
    pub fn stage_started(&self, stage: &str) -> bool {
        self.history.iter().any(|r| r.stage == stage)
    }

    pub fn record(&self, stage: &str, action: &str) -> Option<&ExecutionRecord> {
        self.history
            .iter()
            .find(|r| r.stage == stage && r.action == action)
    }
}
