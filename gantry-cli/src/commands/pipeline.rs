//! Pipeline command handlers
//!
//! Definitions are loaded and validated locally before anything is sent, so
//! a broken file never reaches the orchestrator.

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use colored::*;
use gantry_client::OrchestratorClient;
use gantry_core::domain::approval::ApprovalState;
use gantry_core::domain::run::RunStatus;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use uuid::Uuid;

use crate::config::Config;
use crate::output;

/// Pipeline subcommands
#[derive(Subcommand)]
pub enum PipelineCommands {
    /// Validate a definition file (.lua or .json) without running it
    Validate {
        /// Path to the definition file
        file: PathBuf,
    },
    /// Start a run from a definition file
    Run {
        /// Path to the definition file
        file: PathBuf,

        /// Wait for the run to finish, printing pending approvals
        #[arg(short, long)]
        wait: bool,

        /// Poll interval in milliseconds while waiting
        #[arg(long, default_value = "1000")]
        interval: u64,
    },
}

/// Handle pipeline commands
pub async fn handle_pipeline_command(command: PipelineCommands, config: &Config) -> Result<()> {
    match command {
        PipelineCommands::Validate { file } => validate(&file),
        PipelineCommands::Run {
            file,
            wait,
            interval,
        } => {
            let client = config.client();
            let id = start(&client, &file).await?;
            if wait {
                wait_for_run(&client, id, Duration::from_millis(interval)).await?;
            }
            Ok(())
        }
    }
}

fn validate(file: &Path) -> Result<()> {
    let pipeline = gantry_lua::load_pipeline_file(file)
        .with_context(|| format!("Invalid pipeline definition: {}", file.display()))?;

    println!("{}", "✓ Pipeline definition is valid".green().bold());
    output::print_pipeline(&pipeline);
    println!(
        "  {} stage(s), {} action(s)",
        pipeline.stages.len(),
        pipeline.action_count()
    );

    Ok(())
}

async fn start(client: &OrchestratorClient, file: &Path) -> Result<Uuid> {
    let pipeline = gantry_lua::load_pipeline_file(file)
        .with_context(|| format!("Invalid pipeline definition: {}", file.display()))?;

    let run = client.start_run(pipeline).await?;

    println!("{}", "✓ Run started".green().bold());
    println!("  Run ID:   {}", run.id.to_string().cyan());
    println!("  Pipeline: {}", run.pipeline.bold());

    Ok(run.id)
}

/// Polls until the run leaves `Running`; fails when the run failed
async fn wait_for_run(client: &OrchestratorClient, id: Uuid, interval: Duration) -> Result<()> {
    let mut announced = HashSet::new();

    loop {
        let run = client.get_run(id).await?;
        if run.summary.status != RunStatus::Running {
            println!();
            output::print_run_details(&run);
            if run.summary.status == RunStatus::Failed {
                bail!("run {} failed", id);
            }
            return Ok(());
        }

        let pending = client.list_approvals(Some(ApprovalState::Pending)).await?;
        for approval in pending.iter().filter(|a| a.run_id == id) {
            if announced.insert(approval.id) {
                println!(
                    "{} {}/{} is waiting: gantry approval approve {}",
                    "⏸".yellow(),
                    approval.stage,
                    approval.action.bold(),
                    approval.id
                );
            }
        }

        tokio::time::sleep(interval).await;
    }
}
