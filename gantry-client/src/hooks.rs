//! Lifecycle hook endpoints

use crate::error::Result;
use crate::{OrchestratorClient, decode};
use gantry_core::domain::canary::{CanaryReport, LifecycleEvent};

impl OrchestratorClient {
    /// Run the pre-traffic canary check for a deployment
    ///
    /// A 502 API error means the verdict could not be reported to the
    /// deployment controller.
    pub async fn pre_traffic_hook(&self, event: &LifecycleEvent) -> Result<CanaryReport> {
        let url = self.endpoint("/api/hooks/pre-traffic");
        let response = self.client.post(url).json(event).send().await?;

        decode(response).await
    }
}
