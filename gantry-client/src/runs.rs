//! Run-related API endpoints

use crate::error::Result;
use crate::{OrchestratorClient, decode};
use gantry_core::domain::pipeline::Pipeline;
use gantry_core::dto::run::{RunDetails, RunSummary, StartLuaRun, StartRun};
use uuid::Uuid;

impl OrchestratorClient {
    /// Start a run from a pipeline definition
    pub async fn start_run(&self, pipeline: Pipeline) -> Result<RunSummary> {
        let url = self.endpoint("/api/runs");
        let response = self
            .client
            .post(url)
            .json(&StartRun { pipeline })
            .send()
            .await?;

        decode(response).await
    }

    /// Start a run from Lua source; the orchestrator parses and validates it
    pub async fn start_lua_run(&self, script: impl Into<String>) -> Result<RunSummary> {
        let url = self.endpoint("/api/runs/lua");
        let req = StartLuaRun {
            script: script.into(),
        };
        let response = self.client.post(url).json(&req).send().await?;

        decode(response).await
    }

    /// List all runs, newest first
    pub async fn list_runs(&self) -> Result<Vec<RunSummary>> {
        let url = self.endpoint("/api/runs");
        let response = self.client.get(url).send().await?;

        decode(response).await
    }

    /// Get a run with its execution history
    pub async fn get_run(&self, id: Uuid) -> Result<RunDetails> {
        let url = self.endpoint(&format!("/api/runs/{}", id));
        let response = self.client.get(url).send().await?;

        decode(response).await
    }
}
