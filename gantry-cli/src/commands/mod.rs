//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod approval;
mod hook;
mod pipeline;
mod run;

pub use approval::ApprovalCommands;
pub use hook::HookCommands;
pub use pipeline::PipelineCommands;
pub use run::RunCommands;

use anyhow::Result;
use clap::Subcommand;
use colored::*;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Validate and start pipeline definitions
    Pipeline {
        #[command(subcommand)]
        command: PipelineCommands,
    },
    /// Inspect runs
    Run {
        #[command(subcommand)]
        command: RunCommands,
    },
    /// List and resolve manual approvals
    Approval {
        #[command(subcommand)]
        command: ApprovalCommands,
    },
    /// Trigger deployment lifecycle hooks
    Hook {
        #[command(subcommand)]
        command: HookCommands,
    },
    /// Check that the orchestrator is reachable
    Health,
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Pipeline { command } => pipeline::handle_pipeline_command(command, config).await,
        Commands::Run { command } => run::handle_run_command(command, config).await,
        Commands::Approval { command } => approval::handle_approval_command(command, config).await,
        Commands::Hook { command } => hook::handle_hook_command(command, config).await,
        Commands::Health => health(config).await,
    }
}

async fn health(config: &Config) -> Result<()> {
    config.client().health().await?;
    println!(
        "{}",
        format!("✓ Orchestrator at {} is healthy", config.orchestrator_url).green()
    );
    Ok(())
}
