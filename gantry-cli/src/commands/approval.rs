//! Approval command handlers

use anyhow::{Result, anyhow};
use clap::{Subcommand, ValueEnum};
use colored::*;
use gantry_client::OrchestratorClient;
use gantry_core::domain::approval::{ApprovalDecision, ApprovalState};

use crate::config::Config;
use crate::id_resolver::resolve_approval_id;
use crate::output;
use crate::types::IdOrPrefix;

/// State filter accepted on the command line
#[derive(Clone, Copy, ValueEnum)]
pub enum StateFilter {
    Pending,
    Approved,
    Rejected,
}

impl From<StateFilter> for ApprovalState {
    fn from(filter: StateFilter) -> Self {
        match filter {
            StateFilter::Pending => ApprovalState::Pending,
            StateFilter::Approved => ApprovalState::Approved,
            StateFilter::Rejected => ApprovalState::Rejected,
        }
    }
}

/// Approval subcommands
#[derive(Subcommand)]
pub enum ApprovalCommands {
    /// List approval requests
    List {
        /// Only show requests in this state
        #[arg(short, long, value_enum)]
        state: Option<StateFilter>,
    },
    /// Show one approval request
    Get {
        /// Approval ID or unambiguous prefix
        id: String,
    },
    /// Approve a pending request
    Approve {
        /// Approval ID or unambiguous prefix
        id: String,

        /// Reviewer name
        #[arg(long, env = "USER")]
        by: Option<String>,

        #[arg(short, long)]
        comment: Option<String>,
    },
    /// Reject a pending request, failing its stage
    Reject {
        /// Approval ID or unambiguous prefix
        id: String,

        /// Reviewer name
        #[arg(long, env = "USER")]
        by: Option<String>,

        #[arg(short, long)]
        comment: Option<String>,
    },
}

pub async fn handle_approval_command(command: ApprovalCommands, config: &Config) -> Result<()> {
    let client = config.client();

    match command {
        ApprovalCommands::List { state } => {
            let approvals = client.list_approvals(state.map(Into::into)).await?;
            if approvals.is_empty() {
                println!("{}", "No approvals found.".yellow());
                return Ok(());
            }

            println!(
                "{}",
                format!("Found {} approval(s):", approvals.len()).bold()
            );
            println!();
            for approval in &approvals {
                output::print_approval(approval);
            }
            Ok(())
        }
        ApprovalCommands::Get { id } => {
            let uuid = resolve_approval_id(&client, &IdOrPrefix::parse(&id)).await?;
            output::print_approval(&client.get_approval(uuid).await?);
            Ok(())
        }
        ApprovalCommands::Approve { id, by, comment } => {
            resolve(&client, &id, ApprovalDecision::Approve, by, comment).await
        }
        ApprovalCommands::Reject { id, by, comment } => {
            resolve(&client, &id, ApprovalDecision::Reject, by, comment).await
        }
    }
}

async fn resolve(
    client: &OrchestratorClient,
    id: &str,
    decision: ApprovalDecision,
    by: Option<String>,
    comment: Option<String>,
) -> Result<()> {
    let uuid = resolve_approval_id(client, &IdOrPrefix::parse(id)).await?;

    let approval = client
        .resolve_approval(uuid, decision, by, comment)
        .await
        .map_err(|e| {
            if e.is_conflict() {
                anyhow!("Approval {} was already resolved: {}", uuid, e)
            } else {
                e.into()
            }
        })?;

    let message = match approval.state {
        ApprovalState::Approved => "✓ Approved".green().bold(),
        _ => "✗ Rejected".red().bold(),
    };
    println!("{} {}/{}", message, approval.stage, approval.action);
    println!("  Run: {}", approval.run_id.to_string().dimmed());

    Ok(())
}
