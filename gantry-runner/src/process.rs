//! Process executor
//!
//! Runs an action's command through a shell inside a per-run workspace.
//!
//! Workspace layout:
//! ```text
//! <workspace_base>/<run_id>/
//!   artifacts/<artifact>/         one directory per declared output
//!   actions/<stage>/<action>/     scratch dir, holds the outputs file
//! ```
//!
//! The command sees its resolved environment plus:
//! - `GANTRY_RUN_ID`, `GANTRY_STAGE`, `GANTRY_ACTION`
//! - `GANTRY_ARTIFACTS_DIR`: the run's artifacts directory
//! - `GANTRY_INPUT_ARTIFACT`: location of the input artifact, if any
//! - `GANTRY_CAPABILITIES`: comma-separated capability grants
//! - `GANTRY_OUTPUT`: file to append `NAME=value` output variables to

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use gantry_core::domain::artifact::ArtifactHandle;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::RunnerConfig;
use crate::executor::{ActionContext, ActionExecutor, ActionOutput};

/// Lines of stderr kept in a failure message
const STDERR_TAIL_LINES: usize = 10;

/// Executor that runs action commands as local processes
pub struct ProcessExecutor {
    workspace_base: PathBuf,
    shell: String,
}

impl ProcessExecutor {
    pub fn new(config: &RunnerConfig) -> Self {
        Self {
            workspace_base: config.workspace_base.clone(),
            shell: config.shell.clone(),
        }
    }

    fn run_dir(&self, ctx: &ActionContext) -> PathBuf {
        self.workspace_base.join(ctx.run_id.to_string())
    }
}

#[async_trait]
impl ActionExecutor for ProcessExecutor {
    async fn execute(&self, ctx: &ActionContext) -> Result<ActionOutput> {
        let action = &ctx.action;

        let Some(command) = action.command.as_deref() else {
            debug!(
                "Action {}/{} has no command, nothing to run",
                ctx.stage, action.name
            );
            return Ok(ActionOutput::default());
        };

        let run_dir = self.run_dir(ctx);
        let artifacts_dir = run_dir.join("artifacts");
        let action_dir = run_dir
            .join("actions")
            .join(dir_name(&ctx.stage))
            .join(dir_name(&action.name));

        tokio::fs::create_dir_all(&action_dir)
            .await
            .with_context(|| format!("Failed to create workspace {}", action_dir.display()))?;

        for output in &action.outputs {
            let dir = artifacts_dir.join(dir_name(output));
            tokio::fs::create_dir_all(&dir)
                .await
                .with_context(|| format!("Failed to create artifact dir {}", dir.display()))?;
        }

        let output_file = action_dir.join("outputs.env");

        // Run from the input artifact when there is one, so relative paths
        // in the command resolve against the checked-out source
        let working_dir = ctx
            .input
            .as_ref()
            .and_then(|input| input.location.as_deref())
            .map(PathBuf::from)
            .filter(|path| path.is_dir())
            .unwrap_or_else(|| run_dir.clone());

        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c")
            .arg(command)
            .current_dir(&working_dir)
            .envs(&ctx.env)
            .env("GANTRY_RUN_ID", ctx.run_id.to_string())
            .env("GANTRY_STAGE", &ctx.stage)
            .env("GANTRY_ACTION", &action.name)
            .env("GANTRY_ARTIFACTS_DIR", &artifacts_dir)
            .env("GANTRY_CAPABILITIES", action.capabilities.join(","))
            .env("GANTRY_OUTPUT", &output_file)
            .kill_on_drop(true);

        if let Some(location) = ctx.input.as_ref().and_then(|i| i.location.as_deref()) {
            cmd.env("GANTRY_INPUT_ARTIFACT", location);
        }

        info!("Running '{}' for {}/{}", command, ctx.stage, action.name);

        let output = cmd
            .output()
            .await
            .with_context(|| format!("Failed to spawn '{} -c {}'", self.shell, command))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        for line in stdout.lines().filter(|l| !l.trim().is_empty()) {
            debug!("[{}/{}] {}", ctx.stage, action.name, line);
        }
        for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
            warn!("[{}/{}] {}", ctx.stage, action.name, line);
        }

        if !output.status.success() {
            let code = output
                .status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string());
            bail!(
                "command '{}' exited with {}{}",
                command,
                code,
                stderr_tail(&stderr)
            );
        }

        let variables = read_output_file(&output_file).await?;

        let artifacts = action
            .outputs
            .iter()
            .map(|name| {
                let location = artifacts_dir.join(dir_name(name));
                ArtifactHandle::new(name, &action.name)
                    .with_location(location.display().to_string())
            })
            .collect();

        Ok(ActionOutput {
            artifacts,
            variables,
        })
    }
}

/// Reads `NAME=value` lines; a missing file means no variables
async fn read_output_file(path: &Path) -> Result<HashMap<String, String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(parse_output_lines(&content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
        Err(e) => {
            Err(e).with_context(|| format!("Failed to read outputs file {}", path.display()))
        }
    }
}

/// Parses `NAME=value` lines, skipping blanks and `#` comments
///
/// Later lines override earlier ones.
fn parse_output_lines(content: &str) -> HashMap<String, String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let (name, value) = line.split_once('=')?;
            let name = name.trim();
            (!name.is_empty()).then(|| (name.to_string(), value.to_string()))
        })
        .collect()
}

fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.is_empty() {
        return String::new();
    }
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    format!(": {}", lines[start..].join("\n"))
}

/// Keeps names usable as a single path component
fn dir_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
