//! Gantry CLI
//!
//! Starts pipeline runs on the orchestrator, follows them, and lets
//! reviewers decide the approvals that gate production stages.

mod commands;
mod config;
mod id_resolver;
mod output;
mod types;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;

const WORKFLOW: &str = "\
Typical release:
  gantry pipeline validate pipelines/serverless-app.lua
  gantry pipeline run pipelines/serverless-app.lua --wait
  gantry approval list --state pending
  gantry approval approve <id> --comment \"staging looks good\"";

/// Drive Gantry delivery pipelines, approvals and pre-traffic checks
#[derive(Parser)]
#[command(name = "gantry", version, after_help = WORKFLOW)]
struct Cli {
    /// Orchestrator API root
    #[arg(
        long,
        global = true,
        env = "GANTRY_ORCHESTRATOR_URL",
        default_value = "http://localhost:8080"
    )]
    orchestrator_url: String,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn config(&self) -> Config {
        Config {
            orchestrator_url: self.orchestrator_url.trim_end_matches('/').to_string(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.no_color {
        colored::control::set_override(false);
    }

    let config = cli.config();
    handle_command(cli.command, &config).await
}
