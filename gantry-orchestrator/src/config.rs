//! Orchestrator configuration
//!
//! Collaborator URLs are optional. Whatever is left unset runs in process:
//! the put-book workload as candidate, an in-memory store, and a reporter
//! that only logs.

use anyhow::{Context, Result};
use gantry_canary::CanaryConfig;
use gantry_runner::RunnerConfig;

use crate::service::run::DEFAULT_RUN_RETENTION;

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Address the HTTP API binds to
    pub bind_addr: String,

    /// Function runtime used to invoke the candidate version
    pub canary_invoke_url: Option<String>,

    /// Store the candidate writes to
    pub canary_store_url: Option<String>,

    /// Deployment controller receiving hook verdicts
    pub deployment_controller_url: Option<String>,

    /// Finished runs kept by the registry
    pub run_retention: usize,

    pub runner: RunnerConfig,
    pub canary: CanaryConfig,
}

impl OrchestratorConfig {
    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - ORCHESTRATOR_BIND_ADDR (optional, default: 0.0.0.0:8080)
    /// - CANARY_INVOKE_URL (optional)
    /// - CANARY_STORE_URL (optional)
    /// - DEPLOYMENT_CONTROLLER_URL (optional)
    /// - GANTRY_RUN_RETENTION (optional, default: 500)
    /// - plus the runner and canary variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            bind_addr: std::env::var("ORCHESTRATOR_BIND_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            canary_invoke_url: non_empty_var("CANARY_INVOKE_URL"),
            canary_store_url: non_empty_var("CANARY_STORE_URL"),
            deployment_controller_url: non_empty_var("DEPLOYMENT_CONTROLLER_URL"),
            run_retention: match non_empty_var("GANTRY_RUN_RETENTION") {
                Some(value) => value
                    .parse()
                    .context("GANTRY_RUN_RETENTION must be a positive integer")?,
                None => DEFAULT_RUN_RETENTION,
            },
            runner: RunnerConfig::from_env().context("Invalid runner configuration")?,
            canary: CanaryConfig::from_env().context("Invalid canary configuration")?,
        })
    }

    /// True when the canary hook has no external collaborators at all
    pub fn is_local(&self) -> bool {
        self.canary_invoke_url.is_none()
            && self.canary_store_url.is_none()
            && self.deployment_controller_url.is_none()
    }

    pub fn validate(&self) -> Result<()> {
        if self.bind_addr.trim().is_empty() {
            anyhow::bail!("bind_addr cannot be empty");
        }

        if self.run_retention == 0 {
            anyhow::bail!("run_retention must be greater than 0");
        }

        // A remote candidate writing to a local in-memory store could never
        // be observed by the hook
        if self.canary_invoke_url.is_some() && self.canary_store_url.is_none() {
            anyhow::bail!("CANARY_INVOKE_URL requires CANARY_STORE_URL");
        }

        self.runner.validate()?;
        self.canary.validate()?;
        Ok(())
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            canary_invoke_url: None,
            canary_store_url: None,
            deployment_controller_url: None,
            run_retention: DEFAULT_RUN_RETENTION,
            runner: RunnerConfig::default(),
            canary: CanaryConfig::default(),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
