//! Approval domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// State of an approval request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalState {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ApprovalState::Pending)
    }
}

impl fmt::Display for ApprovalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApprovalState::Pending => write!(f, "pending"),
            ApprovalState::Approved => write!(f, "approved"),
            ApprovalState::Rejected => write!(f, "rejected"),
        }
    }
}

/// Decision taken by an external reviewer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalDecision {
    Approve,
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApprovalError {
    #[error("approval {id} is already {state}")]
    AlreadyResolved { id: Uuid, state: ApprovalState },
}

/// Manual approval requested by an Approval action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRequest {
    pub id: Uuid,
    pub run_id: Uuid,
    pub stage: String,
    pub action: String,
    pub rationale: Option<String>,
    pub state: ApprovalState,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<String>,
    pub comment: Option<String>,
}

impl ApprovalRequest {
    /// Creates a pending request
    pub fn new(
        run_id: Uuid,
        stage: impl Into<String>,
        action: impl Into<String>,
        rationale: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            run_id,
            stage: stage.into(),
            action: action.into(),
            rationale,
            state: ApprovalState::Pending,
            created_at: Utc::now(),
            resolved_at: None,
            resolved_by: None,
            comment: None,
        }
    }

    /// Applies a reviewer decision
    ///
    /// A request transitions exactly once; resolving a terminal request fails
    /// and leaves it untouched.
    pub fn resolve(
        &mut self,
        decision: ApprovalDecision,
        resolved_by: Option<String>,
        comment: Option<String>,
    ) -> Result<ApprovalState, ApprovalError> {
        if self.state.is_terminal() {
            return Err(ApprovalError::AlreadyResolved {
                id: self.id,
                state: self.state,
            });
        }

        self.state = match decision {
            ApprovalDecision::Approve => ApprovalState::Approved,
            ApprovalDecision::Reject => ApprovalState::Rejected,
        };
        self.resolved_at = Some(Utc::now());
        self.resolved_by = resolved_by;
        self.comment = comment;

        Ok(self.state)
    }
}
