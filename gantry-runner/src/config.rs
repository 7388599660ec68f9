//! Runner configuration
//!
//! Defines the configurable parameters for pipeline execution: where action
//! workspaces live, which shell runs commands, how many actions may run
//! at the same time, and how many decided approvals are kept.

use std::path::PathBuf;

/// Runner configuration
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Base directory for per-run workspaces
    pub workspace_base: PathBuf,

    /// Shell used to run action commands (invoked as `<shell> -c <command>`)
    pub shell: String,

    /// Maximum number of actions executing at once across all runs
    pub max_parallel_actions: usize,

    /// Decided approval requests kept for inspection
    pub approval_retention: usize,
}

impl RunnerConfig {
    /// Creates a new configuration with defaults
    pub fn new(workspace_base: PathBuf) -> Self {
        Self {
            workspace_base,
            shell: "sh".to_string(),
            max_parallel_actions: 4,
            approval_retention: crate::approval::DEFAULT_APPROVAL_RETENTION,
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - GANTRY_WORKSPACE (optional, default: <tmp>/gantry)
    /// - GANTRY_SHELL (optional, default: sh)
    /// - GANTRY_MAX_PARALLEL_ACTIONS (optional, default: 4)
    /// - GANTRY_APPROVAL_RETENTION (optional, default: 1000)
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("GANTRY_WORKSPACE") {
            config.workspace_base = PathBuf::from(workspace);
        }

        if let Ok(shell) = std::env::var("GANTRY_SHELL") {
            config.shell = shell;
        }

        if let Ok(value) = std::env::var("GANTRY_MAX_PARALLEL_ACTIONS") {
            config.max_parallel_actions = value.parse().map_err(|_| {
                anyhow::anyhow!("GANTRY_MAX_PARALLEL_ACTIONS must be a positive integer")
            })?;
        }

        if let Ok(value) = std::env::var("GANTRY_APPROVAL_RETENTION") {
            config.approval_retention = value.parse().map_err(|_| {
                anyhow::anyhow!("GANTRY_APPROVAL_RETENTION must be a positive integer")
            })?;
        }

        Ok(config)
    }

    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }

    pub fn with_max_parallel_actions(mut self, max: usize) -> Self {
        self.max_parallel_actions = max;
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.workspace_base.as_os_str().is_empty() {
            anyhow::bail!("workspace_base cannot be empty");
        }

        if self.shell.trim().is_empty() {
            anyhow::bail!("shell cannot be empty");
        }

        if self.max_parallel_actions == 0 {
            anyhow::bail!("max_parallel_actions must be greater than 0");
        }

        if self.approval_retention == 0 {
            anyhow::bail!("approval_retention must be greater than 0");
        }

        Ok(())
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self::new(std::env::temp_dir().join("gantry"))
    }
}
