//! Terminal rendering for runs, approvals and canary reports

use colored::*;
use gantry_core::domain::approval::{ApprovalRequest, ApprovalState};
use gantry_core::domain::canary::{CanaryReport, Verdict};
use gantry_core::domain::pipeline::Pipeline;
use gantry_core::domain::run::{ActionOutcome, ExecutionRecord, RunStatus};
use gantry_core::dto::run::{RunDetails, RunSummary};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn status(status: RunStatus) -> ColoredString {
    match status {
        RunStatus::Running => status.to_string().yellow(),
        RunStatus::Succeeded => status.to_string().green(),
        RunStatus::Failed => status.to_string().red(),
    }
}

fn approval_state(state: ApprovalState) -> ColoredString {
    match state {
        ApprovalState::Pending => state.to_string().yellow(),
        ApprovalState::Approved => state.to_string().green(),
        ApprovalState::Rejected => state.to_string().red(),
    }
}

fn outcome(outcome: &ActionOutcome) -> String {
    match outcome {
        ActionOutcome::Succeeded => "Succeeded".green().to_string(),
        ActionOutcome::Failed { kind, message } => {
            format!("{} {}", kind.to_string().red(), message.dimmed())
        }
        ActionOutcome::Discarded => "Discarded".yellow().to_string(),
    }
}

/// Print the stage and action layout of a definition
pub fn print_pipeline(pipeline: &Pipeline) {
    println!("  Name:   {}", pipeline.name.bold());
    if let Some(description) = &pipeline.description {
        println!("  About:  {}", description.dimmed());
    }
    for stage in &pipeline.stages {
        println!("  {} {}", "▸".cyan(), stage.name.bold());
        for group in stage.run_order_groups() {
            let names: Vec<String> = group
                .actions
                .iter()
                .map(|a| format!("{} ({})", a.name, a.kind))
                .collect();
            println!(
                "    {} {}",
                format!("[{}]", group.run_order).dimmed(),
                names.join(", ")
            );
        }
    }
}

pub fn print_run_summary(run: &RunSummary) {
    println!("  {} {}", "▸".cyan(), run.pipeline.bold());
    println!("    ID:      {}", run.id.to_string().dimmed());
    println!("    Status:  {}", status(run.status));
    println!(
        "    Started: {}",
        run.started_at.format(TIME_FORMAT).to_string().dimmed()
    );
    if let Some(failure) = &run.failure {
        println!("    Failure: {}", failure.to_string().red());
    }
    println!();
}

pub fn print_run_details(run: &RunDetails) {
    let summary = &run.summary;
    println!("{}", "Run Details:".bold());
    println!("  ID:        {}", summary.id.to_string().cyan());
    println!("  Pipeline:  {}", summary.pipeline.bold());
    println!("  Status:    {}", status(summary.status));
    println!("  Started:   {}", summary.started_at.format(TIME_FORMAT));
    if let Some(completed_at) = summary.completed_at {
        println!("  Completed: {}", completed_at.format(TIME_FORMAT));
    }
    if let Some(failure) = &summary.failure {
        println!("  Failure:   {}", failure.to_string().red());
    }

    println!("\n{}", "History:".bold());
    if run.history.is_empty() {
        println!("  {}", "No actions completed yet.".dimmed());
    }
    for record in &run.history {
        print_record(record);
    }
}

fn print_record(record: &ExecutionRecord) {
    let elapsed = record.completed_at - record.started_at;
    println!(
        "  {}/{} {} {}",
        record.stage,
        record.action.bold(),
        outcome(&record.outcome),
        format!("({} ms)", elapsed.num_milliseconds()).dimmed()
    );
}

pub fn print_approval(approval: &ApprovalRequest) {
    println!(
        "  {} {}/{}",
        "▸".cyan(),
        approval.stage,
        approval.action.bold()
    );
    println!("    ID:        {}", approval.id.to_string().dimmed());
    println!("    Run:       {}", approval.run_id.to_string().dimmed());
    println!("    State:     {}", approval_state(approval.state));
    if let Some(rationale) = &approval.rationale {
        println!("    Rationale: {}", rationale);
    }
    if let Some(by) = &approval.resolved_by {
        println!("    By:        {}", by);
    }
    if let Some(comment) = &approval.comment {
        println!("    Comment:   {}", comment.dimmed());
    }
    println!();
}

pub fn print_canary_report(report: &CanaryReport) {
    let verdict = match report.verdict {
        Verdict::Succeeded => report.verdict.to_string().green().bold(),
        Verdict::Failed => report.verdict.to_string().red().bold(),
    };
    println!("{} {}", "Verdict:".bold(), verdict);
    println!("  Deployment: {}", report.event.deployment_id);
    println!("  Execution:  {}", report.event.hook_execution_id);
    println!("  Candidate:  {}", report.check.candidate_version.cyan());
    println!("  Sentinel:   {}", report.check.sentinel_key.dimmed());
    if let Some(reason) = &report.check.reason {
        println!("  Reason:     {}", reason.red());
    }
    if let Some(cleanup_error) = &report.cleanup_error {
        println!("  Cleanup:    {}", cleanup_error.yellow());
    }
}
