//! Approval-related API endpoints

use crate::error::Result;
use crate::{OrchestratorClient, decode};
use gantry_core::domain::approval::{ApprovalDecision, ApprovalRequest, ApprovalState};
use gantry_core::dto::approval::ResolveApproval;
use uuid::Uuid;

impl OrchestratorClient {
    /// List approval requests, optionally only those in one state
    pub async fn list_approvals(&self, state: Option<ApprovalState>) -> Result<Vec<ApprovalRequest>> {
        let url = self.endpoint("/api/approvals");
        let mut request = self.client.get(url);
        if let Some(state) = state {
            request = request.query(&[("state", state.to_string())]);
        }
        let response = request.send().await?;

        decode(response).await
    }

    pub async fn get_approval(&self, id: Uuid) -> Result<ApprovalRequest> {
        let url = self.endpoint(&format!("/api/approvals/{}", id));
        let response = self.client.get(url).send().await?;

        decode(response).await
    }

    /// Approve or reject a pending request
    ///
    /// Fails with a 409 API error if the request was already resolved.
    pub async fn resolve_approval(
        &self,
        id: Uuid,
        decision: ApprovalDecision,
        resolved_by: Option<String>,
        comment: Option<String>,
    ) -> Result<ApprovalRequest> {
        let url = self.endpoint(&format!("/api/approvals/{}/resolve", id));
        let req = ResolveApproval {
            decision,
            resolved_by,
            comment,
        };
        let response = self.client.post(url).json(&req).send().await?;

        decode(response).await
    }
}
