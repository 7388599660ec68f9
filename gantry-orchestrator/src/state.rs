//! Shared application state

use anyhow::{Context, Result};
use gantry_canary::{
    CanaryHook, CandidateInvoker, ConsistencyStore, HttpInvoker, HttpLifecycleReporter, HttpStore,
    InMemoryStore, LifecycleReporter, LocalInvoker, LogReporter,
};
use gantry_runner::{ApprovalGate, LogNotifier, PipelineEngine, ProcessExecutor};
use std::sync::Arc;
use tracing::info;

use crate::config::OrchestratorConfig;
use crate::service::run::RunRegistry;

#[derive(Clone)]
pub struct AppState {
    pub engine: PipelineEngine,
    pub runs: Arc<RunRegistry>,
    pub hook: Arc<CanaryHook>,
}

impl AppState {
    pub fn new(engine: PipelineEngine, runs: RunRegistry, hook: CanaryHook) -> Self {
        Self {
            engine,
            runs: Arc::new(runs),
            hook: Arc::new(hook),
        }
    }

    /// Wires the engine and the canary hook from configuration
    pub fn from_config(config: &OrchestratorConfig) -> Result<Self> {
        let executor = Arc::new(ProcessExecutor::new(&config.runner));
        let approvals = Arc::new(
            ApprovalGate::new(Arc::new(LogNotifier))
                .with_retention(config.runner.approval_retention),
        );
        let engine = PipelineEngine::new(executor, approvals, &config.runner);

        let store: Arc<dyn ConsistencyStore> = match &config.canary_store_url {
            Some(url) => {
                info!("Canary store: {}", url);
                Arc::new(HttpStore::new(url).context("Invalid CANARY_STORE_URL")?)
            }
            None => {
                info!("Canary store: in-memory");
                Arc::new(InMemoryStore::new())
            }
        };

        let invoker: Arc<dyn CandidateInvoker> = match &config.canary_invoke_url {
            Some(url) => {
                info!("Canary candidate invoker: {}", url);
                Arc::new(HttpInvoker::new(url).context("Invalid CANARY_INVOKE_URL")?)
            }
            None => {
                info!("Canary candidate invoker: local put-book workload");
                Arc::new(LocalInvoker::new(Arc::clone(&store), &config.canary.table))
            }
        };

        let reporter: Arc<dyn LifecycleReporter> = match &config.deployment_controller_url {
            Some(url) => {
                info!("Deployment controller: {}", url);
                Arc::new(HttpLifecycleReporter::new(url))
            }
            None => {
                info!("Deployment controller: none, verdicts are only logged");
                Arc::new(LogReporter)
            }
        };

        let hook = CanaryHook::new(config.canary.clone(), invoker, store, reporter);

        let runs = RunRegistry::with_retention(config.run_retention);

        Ok(Self::new(engine, runs, hook))
    }
}
