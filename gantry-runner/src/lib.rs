//! Gantry Runner
//!
//! The pipeline execution engine and its collaborators.
//!
//! Architecture:
//! - Configuration: Load settings from environment or defaults
//! - Store: Per-run artifact handles and namespaced output variables
//! - Approval gate: Pending approvals and their external resolution
//! - Executors: The seam to the build/test/deploy environment
//! - Engine: Stage sequencing, run-order waves and halt-on-failure
//!
//! Each call to `PipelineEngine::run` is a fresh run with its own store; the
//! only thing it leaves behind is the execution history it appended.

pub mod approval;
pub mod config;
pub mod engine;
pub mod executor;
pub mod history;
pub mod process;
pub mod store;

pub use approval::{ApprovalGate, ApprovalNotifier, GateError, LogNotifier, PendingApproval};
pub use config::RunnerConfig;
pub use engine::PipelineEngine;
pub use executor::{ActionContext, ActionExecutor, ActionOutput};
pub use history::RunHistory;
pub use process::ProcessExecutor;
pub use store::{RunStore, StoreError};
