//! Action executor seam
//!
//! The engine never runs build, test or deploy work itself. It hands each
//! non-approval action to an `ActionExecutor` together with its resolved
//! environment and input artifact, and publishes whatever comes back.

use anyhow::Result;
use async_trait::async_trait;
use gantry_core::domain::action::Action;
use gantry_core::domain::artifact::ArtifactHandle;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Everything an executor needs to run one action
#[derive(Debug, Clone)]
pub struct ActionContext {
    pub run_id: Uuid,
    pub stage: String,
    pub action: Action,
    /// Environment with every variable reference already resolved
    pub env: HashMap<String, String>,
    pub input: Option<Arc<ArtifactHandle>>,
}

/// Outputs produced by a successful action
#[derive(Debug, Clone, Default)]
pub struct ActionOutput {
    pub artifacts: Vec<ArtifactHandle>,
    pub variables: HashMap<String, String>,
}

impl ActionOutput {
    pub fn with_artifact(mut self, artifact: ArtifactHandle) -> Self {
        self.artifacts.push(artifact);
        self
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }
}

/// Runs Source, Build, Test and Deploy actions
///
/// An `Err` is an action failure; the engine records the error chain as the
/// failure message.
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    async fn execute(&self, ctx: &ActionContext) -> Result<ActionOutput>;
}
