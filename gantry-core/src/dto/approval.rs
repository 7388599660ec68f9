//! Approval DTOs

use serde::{Deserialize, Serialize};

use crate::domain::approval::ApprovalDecision;

/// Reviewer decision submitted through the approval channel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveApproval {
    pub decision: ApprovalDecision,
    #[serde(default)]
    pub resolved_by: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}
