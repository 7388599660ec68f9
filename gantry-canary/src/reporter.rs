//! Lifecycle status reporter
//!
//! Delivers the hook verdict to the deployment controller, which then
//! continues shifting traffic or rolls back. No retries happen here; a
//! failed delivery is returned to the hook.

use async_trait::async_trait;
use gantry_core::domain::canary::{LifecycleEvent, Verdict};
use gantry_core::dto::hook::LifecycleStatusUpdate;
use reqwest::Client;
use tracing::info;

use crate::error::{HookError, Result};

#[async_trait]
pub trait LifecycleReporter: Send + Sync {
    async fn report(&self, event: &LifecycleEvent, verdict: Verdict) -> Result<()>;
}

/// Reporter posting `LifecycleStatusUpdate` to the deployment controller
///
/// Endpoint: `POST {base}/lifecycle-hook-executions/status`
#[derive(Debug, Clone)]
pub struct HttpLifecycleReporter {
    base_url: String,
    client: Client,
}

impl HttpLifecycleReporter {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl LifecycleReporter for HttpLifecycleReporter {
    async fn report(&self, event: &LifecycleEvent, verdict: Verdict) -> Result<()> {
        let url = format!("{}/lifecycle-hook-executions/status", self.base_url);
        let update = LifecycleStatusUpdate::new(event, verdict);

        let response = self
            .client
            .post(&url)
            .json(&update)
            .send()
            .await
            .map_err(|e| HookError::Reporting(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HookError::Reporting(format!(
                "controller answered {}: {}",
                status, body
            )));
        }

        Ok(())
    }
}

/// Reporter that only logs the verdict
pub struct LogReporter;

#[async_trait]
impl LifecycleReporter for LogReporter {
    async fn report(&self, event: &LifecycleEvent, verdict: Verdict) -> Result<()> {
        info!(
            "Lifecycle hook {} of deployment {}: {}",
            event.hook_execution_id, event.deployment_id, verdict
        );
        Ok(())
    }
}
