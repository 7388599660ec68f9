//! Run command handlers

use anyhow::{Result, anyhow};
use clap::Subcommand;
use colored::*;

use crate::config::Config;
use crate::id_resolver::resolve_run_id;
use crate::output;
use crate::types::IdOrPrefix;

/// Run subcommands
#[derive(Subcommand)]
pub enum RunCommands {
    /// List all runs
    List,
    /// Get run details and execution history
    Get {
        /// Run ID or unambiguous prefix
        id: String,

        /// Print the raw JSON document instead of the formatted view
        #[arg(long)]
        json: bool,
    },
}

pub async fn handle_run_command(command: RunCommands, config: &Config) -> Result<()> {
    let client = config.client();

    match command {
        RunCommands::List => {
            let runs = client.list_runs().await?;
            if runs.is_empty() {
                println!("{}", "No runs found.".yellow());
                return Ok(());
            }

            println!("{}", format!("Found {} run(s):", runs.len()).bold());
            println!();
            for run in &runs {
                output::print_run_summary(run);
            }
            Ok(())
        }
        RunCommands::Get { id, json } => {
            let uuid = resolve_run_id(&client, &IdOrPrefix::parse(&id)).await?;
            let run = client.get_run(uuid).await.map_err(|e| {
                if e.is_not_found() {
                    anyhow!("Run {} not found", uuid)
                } else {
                    e.into()
                }
            })?;
            if json {
                println!("{}", serde_json::to_string_pretty(&run)?);
            } else {
                output::print_run_details(&run);
            }
            Ok(())
        }
    }
}
