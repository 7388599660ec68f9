//! Canary (pre-traffic) validation domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a validation gate reported to the deployment controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Succeeded,
    Failed,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Succeeded => write!(f, "Succeeded"),
            Verdict::Failed => write!(f, "Failed"),
        }
    }
}

/// Correlation identifiers supplied by the deployment controller when it
/// invokes a lifecycle hook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    #[serde(rename = "DeploymentId")]
    pub deployment_id: String,
    #[serde(rename = "LifecycleEventHookExecutionId")]
    pub hook_execution_id: String,
}

impl LifecycleEvent {
    pub fn new(deployment_id: impl Into<String>, hook_execution_id: impl Into<String>) -> Self {
        Self {
            deployment_id: deployment_id.into(),
            hook_execution_id: hook_execution_id.into(),
        }
    }
}

/// One synthetic-transaction check against a candidate version
///
/// Lives for a single deployment attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanaryCheck {
    pub candidate_version: String,
    /// Key of the sentinel record in the downstream store
    pub sentinel_key: String,
    /// Synthetic record sent to the candidate
    pub payload: serde_json::Value,
    pub verdict: Option<Verdict>,
    pub reason: Option<String>,
    pub started_at: DateTime<Utc>,
}

impl CanaryCheck {
    pub fn new(
        candidate_version: impl Into<String>,
        sentinel_key: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            candidate_version: candidate_version.into(),
            sentinel_key: sentinel_key.into(),
            payload,
            verdict: None,
            reason: None,
            started_at: Utc::now(),
        }
    }

    pub fn conclude(&mut self, verdict: Verdict, reason: Option<String>) {
        self.verdict = Some(verdict);
        self.reason = reason;
    }
}

/// What the hook did for one lifecycle event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanaryReport {
    pub event: LifecycleEvent,
    pub check: CanaryCheck,
    pub verdict: Verdict,
    /// Set when the sentinel record could not be deleted
    pub cleanup_error: Option<String>,
    pub completed_at: DateTime<Utc>,
}
