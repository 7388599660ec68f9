//! Lifecycle hook DTOs

use serde::{Deserialize, Serialize};

use crate::domain::canary::{LifecycleEvent, Verdict};

/// Status update sent to the deployment controller for a hook execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleStatusUpdate {
    pub deployment_id: String,
    pub lifecycle_event_hook_execution_id: String,
    pub status: Verdict,
}

impl LifecycleStatusUpdate {
    pub fn new(event: &LifecycleEvent, status: Verdict) -> Self {
        Self {
            deployment_id: event.deployment_id.clone(),
            lifecycle_event_hook_execution_id: event.hook_execution_id.clone(),
            status,
        }
    }
}
