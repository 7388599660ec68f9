//! Lifecycle hook command handlers

use anyhow::{Result, bail};
use clap::Subcommand;
use gantry_core::domain::canary::{LifecycleEvent, Verdict};

use crate::config::Config;
use crate::output;

/// Hook subcommands
#[derive(Subcommand)]
pub enum HookCommands {
    /// Run the pre-traffic canary check for a deployment
    PreTraffic {
        /// Deployment ID assigned by the deployment controller
        #[arg(long)]
        deployment_id: String,

        /// Lifecycle hook execution ID
        #[arg(long)]
        execution_id: String,
    },
}

pub async fn handle_hook_command(command: HookCommands, config: &Config) -> Result<()> {
    match command {
        HookCommands::PreTraffic {
            deployment_id,
            execution_id,
        } => {
            let event = LifecycleEvent::new(deployment_id, execution_id);
            let report = config.client().pre_traffic_hook(&event).await?;

            output::print_canary_report(&report);
            if report.verdict == Verdict::Failed {
                bail!("candidate {} failed validation", report.check.candidate_version);
            }
            Ok(())
        }
    }
}
