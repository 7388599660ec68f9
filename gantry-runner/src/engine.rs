//! Pipeline engine
//!
//! Runs a validated pipeline stage by stage. Within a stage, actions are
//! grouped by run order; each group runs concurrently and must finish before
//! the next group starts. The first action failure halts the stage and the
//! whole run: no later group or stage is started, and siblings that finish
//! after the failure are recorded as discarded. An Approval action still
//! waiting when its group halts stops waiting and is discarded as well; the
//! undecided request is closed when the run ends.

use chrono::{DateTime, Utc};
use gantry_core::DefinitionError;
use gantry_core::domain::action::Action;
use gantry_core::domain::approval::ApprovalState;
use gantry_core::domain::pipeline::{Pipeline, RunOrderGroup, Stage};
use gantry_core::domain::run::{
    ActionOutcome, ExecutionRecord, FailureKind, PipelineResult, RunStatus, StageFailure,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Semaphore, watch};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::approval::ApprovalGate;
use crate::config::RunnerConfig;
use crate::executor::{ActionContext, ActionExecutor, ActionOutput};
use crate::history::RunHistory;
use crate::store::RunStore;

type ActionError = (FailureKind, String);

/// Result of one spawned action task
struct ActionReport {
    action: String,
    namespace: String,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
    result: Result<ActionOutput, ActionError>,
}

/// Executes pipelines against an executor and an approval gate
///
/// Cloning is cheap; clones share the executor, the gate and the
/// parallelism limit.
#[derive(Clone)]
pub struct PipelineEngine {
    executor: Arc<dyn ActionExecutor>,
    approvals: Arc<ApprovalGate>,
    permits: Arc<Semaphore>,
}

impl PipelineEngine {
    pub fn new(
        executor: Arc<dyn ActionExecutor>,
        approvals: Arc<ApprovalGate>,
        config: &RunnerConfig,
    ) -> Self {
        Self {
            executor,
            approvals,
            permits: Arc::new(Semaphore::new(config.max_parallel_actions.max(1))),
        }
    }

    pub fn approvals(&self) -> &Arc<ApprovalGate> {
        &self.approvals
    }

    /// Runs a pipeline to completion with a fresh run id
    ///
    /// # Errors
    /// Only a definition error is returned as `Err`, before any stage starts.
    /// Runtime failures are reported in the `PipelineResult`.
    pub async fn run(&self, pipeline: &Pipeline) -> Result<PipelineResult, DefinitionError> {
        self.run_with(Uuid::new_v4(), pipeline, Arc::new(RunHistory::new()))
            .await
    }

    /// Runs a pipeline, appending records to a caller-owned history
    pub async fn run_with(
        &self,
        run_id: Uuid,
        pipeline: &Pipeline,
        history: Arc<RunHistory>,
    ) -> Result<PipelineResult, DefinitionError> {
        pipeline.validate()?;

        let started_at = Utc::now();
        let store = Arc::new(RunStore::new());

        info!(
            "Starting run {} of pipeline '{}' ({} stages)",
            run_id,
            pipeline.name,
            pipeline.stages.len()
        );

        let mut failure = None;

        for (idx, stage) in pipeline.stages.iter().enumerate() {
            info!(
                "Executing stage {}/{}: {}",
                idx + 1,
                pipeline.stages.len(),
                stage.name
            );

            if let Err(stage_failure) = self.run_stage(run_id, stage, &store, &history).await {
                error!("Run {} halted: {}", run_id, stage_failure);
                failure = Some(stage_failure);
                break;
            }

            info!("Stage '{}' succeeded", stage.name);
        }

        let status = if failure.is_some() {
            RunStatus::Failed
        } else {
            RunStatus::Succeeded
        };

        self.approvals.close_run(run_id);
        info!("Run {} of '{}' finished: {}", run_id, pipeline.name, status);

        Ok(PipelineResult {
            run_id,
            pipeline: pipeline.name.clone(),
            status,
            failure,
            history: history.snapshot(),
            started_at,
            completed_at: Utc::now(),
        })
    }

    async fn run_stage(
        &self,
        run_id: Uuid,
        stage: &Stage,
        store: &Arc<RunStore>,
        history: &RunHistory,
    ) -> Result<(), StageFailure> {
        for group in stage.run_order_groups() {
            self.run_group(run_id, &stage.name, group, store, history)
                .await?;
        }
        Ok(())
    }

    /// Runs one run-order group and waits for every action in it
    async fn run_group(
        &self,
        run_id: Uuid,
        stage: &str,
        group: RunOrderGroup<'_>,
        store: &Arc<RunStore>,
        history: &RunHistory,
    ) -> Result<(), StageFailure> {
        debug!(
            "Stage '{}' run order {}: {} action(s)",
            stage,
            group.run_order,
            group.actions.len()
        );

        let (halt_tx, halt_rx) = watch::channel(false);
        let mut tasks = JoinSet::new();
        let mut names = HashMap::new();

        for action in group.actions {
            let engine = self.clone();
            let action = action.clone();
            let name = action.name.clone();
            let stage = stage.to_string();
            let store = Arc::clone(store);
            let halted = halt_rx.clone();

            let handle = tasks.spawn(async move {
                engine
                    .execute_action(run_id, stage, action, store, halted)
                    .await
            });
            names.insert(handle.id(), name);
        }

        let mut failure: Option<StageFailure> = None;

        while let Some(joined) = tasks.join_next().await {
            let report = match joined {
                Ok(report) => report,
                Err(e) => {
                    let action = names
                        .get(&e.id())
                        .cloned()
                        .unwrap_or_else(|| "<unknown>".to_string());
                    error!("Action {}/{} task panicked: {}", stage, action, e);
                    let now = Utc::now();
                    ActionReport {
                        action,
                        namespace: String::new(),
                        started_at: now,
                        completed_at: now,
                        result: Err((FailureKind::ActionFailure, format!("task panicked: {}", e))),
                    }
                }
            };

            let outcome = match report.result {
                Ok(output) if failure.is_none() => {
                    match store.publish(&report.namespace, output.artifacts, output.variables) {
                        Ok(()) => {
                            info!("Action {}/{} succeeded", stage, report.action);
                            ActionOutcome::Succeeded
                        }
                        Err(e) => {
                            let message = format!("failed to publish outputs: {}", e);
                            failure = Some(stage_failure(
                                stage,
                                &report.action,
                                FailureKind::ActionFailure,
                                &message,
                            ));
                            halt_tx.send_replace(true);
                            ActionOutcome::failed(FailureKind::ActionFailure, message)
                        }
                    }
                }
                Ok(_) => {
                    warn!(
                        "Action {}/{} finished after the stage failed, discarding its outputs",
                        stage, report.action
                    );
                    ActionOutcome::Discarded
                }
                Err((kind, message)) => {
                    warn!("Action {}/{} failed ({}): {}", stage, report.action, kind, message);
                    if failure.is_none() {
                        failure = Some(stage_failure(stage, &report.action, kind, &message));
                        halt_tx.send_replace(true);
                    }
                    ActionOutcome::failed(kind, message)
                }
            };

            history.append(ExecutionRecord {
                stage: stage.to_string(),
                action: report.action,
                started_at: report.started_at,
                completed_at: report.completed_at,
                outcome,
            });
        }

        match failure {
            Some(failure) => Err(failure),
            None => Ok(()),
        }
    }

    async fn execute_action(
        self,
        run_id: Uuid,
        stage: String,
        action: Action,
        store: Arc<RunStore>,
        halted: watch::Receiver<bool>,
    ) -> ActionReport {
        let started_at = Utc::now();
        let result = self
            .perform(run_id, &stage, &action, &store, halted)
            .await;

        ActionReport {
            namespace: action.namespace().to_string(),
            action: action.name,
            started_at,
            completed_at: Utc::now(),
            result,
        }
    }

    async fn perform(
        &self,
        run_id: Uuid,
        stage: &str,
        action: &Action,
        store: &RunStore,
        halted: watch::Receiver<bool>,
    ) -> Result<ActionOutput, ActionError> {
        let env = store
            .resolve_env(&action.env)
            .map_err(|e| (FailureKind::ResolutionError, e.to_string()))?;

        let input = action
            .input
            .as_deref()
            .map(|name| store.artifact(name))
            .transpose()
            .map_err(|e| (FailureKind::ResolutionError, e.to_string()))?;

        if action.is_approval() {
            return self.await_approval(run_id, stage, action, halted).await;
        }

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| (FailureKind::ActionFailure, e.to_string()))?;

        debug!("Executing action {}/{} ({})", stage, action.name, action.kind);

        let ctx = ActionContext {
            run_id,
            stage: stage.to_string(),
            action: action.clone(),
            env,
            input,
        };

        let output = self
            .executor
            .execute(&ctx)
            .await
            .map_err(|e| (FailureKind::ActionFailure, format!("{:#}", e)))?;

        check_outputs(stage, action, output)
    }

    /// Opens an approval request and suspends until it is resolved
    ///
    /// If the group halts first, the action stops waiting without deciding
    /// the request; the group records it as discarded.
    async fn await_approval(
        &self,
        run_id: Uuid,
        stage: &str,
        action: &Action,
        mut halted: watch::Receiver<bool>,
    ) -> Result<ActionOutput, ActionError> {
        let already_halted = *halted.borrow();
        if already_halted {
            debug!(
                "Stage '{}' halted before {} requested approval",
                stage, action.name
            );
            return Ok(ActionOutput::default());
        }

        let pending = self.approvals.open(run_id, stage, action).await;
        let id = pending.id();
        info!("Action {}/{} waiting for approval {}", stage, action.name, id);

        let state = tokio::select! {
            decision = pending.decision() => {
                decision.map_err(|e| (FailureKind::ApprovalRejected, e.to_string()))?
            }
            _ = wait_for_halt(&mut halted) => {
                info!(
                    "Action {}/{} stopped waiting for approval {}: the stage failed",
                    stage, action.name, id
                );
                return Ok(ActionOutput::default());
            }
        };

        match state {
            ApprovalState::Approved => Ok(ActionOutput::default()),
            _ => {
                let comment = self
                    .approvals
                    .get(id)
                    .and_then(|request| request.comment)
                    .map(|c| format!(": {}", c))
                    .unwrap_or_default();
                Err((
                    FailureKind::ApprovalRejected,
                    format!("approval {} was rejected{}", id, comment),
                ))
            }
        }
    }
}

/// Resolves once the group is halted; never resolves if it finishes cleanly
async fn wait_for_halt(halted: &mut watch::Receiver<bool>) {
    let halted_cleanly = halted.wait_for(|halted| *halted).await.is_ok();
    if !halted_cleanly {
        std::future::pending::<()>().await;
    }
}

/// Enforces the declared outputs of an action
///
/// Every declared artifact must be produced. Undeclared artifacts and
/// variables are dropped; a declared variable that was not emitted simply
/// stays unset.
fn check_outputs(
    stage: &str,
    action: &Action,
    output: ActionOutput,
) -> Result<ActionOutput, ActionError> {
    for declared in &action.outputs {
        if !output.artifacts.iter().any(|a| &a.name == declared) {
            return Err((
                FailureKind::ActionFailure,
                format!("declared output artifact '{}' was not produced", declared),
            ));
        }
    }

    let artifacts = output
        .artifacts
        .into_iter()
        .filter(|artifact| {
            let declared = action.outputs.contains(&artifact.name);
            if !declared {
                warn!(
                    "Action {}/{} produced undeclared artifact '{}', ignoring it",
                    stage, action.name, artifact.name
                );
            }
            declared
        })
        .collect();

    let variables = output
        .variables
        .into_iter()
        .filter(|(name, _)| {
            let declared = action.variables.contains(name);
            if !declared {
                warn!(
                    "Action {}/{} emitted undeclared variable '{}', ignoring it",
                    stage, action.name, name
                );
            }
            declared
        })
        .collect();

    Ok(ActionOutput {
        artifacts,
        variables,
    })
}

fn stage_failure(stage: &str, action: &str, kind: FailureKind, message: &str) -> StageFailure {
    StageFailure {
        stage: stage.to_string(),
        action: action.to_string(),
        kind,
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use async_trait::async_trait;
    use crate::approval::ApprovalNotifier;
    use crate::store::StoreError;
    use gantry_core::domain::action::{ActionKind, EnvValue, VariableRef};
    use gantry_core::domain::approval::{ApprovalDecision, ApprovalRequest};
    use gantry_core::domain::artifact::ArtifactHandle;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::Notify;

    /// Records calls and fails actions whose name is listed
    #[derive(Default)]
    struct FakeExecutor {
        calls: Mutex<Vec<String>>,
        failing: Vec<String>,
    }

    impl FakeExecutor {
        fn failing(names: &[&str]) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                failing: names.iter().map(|n| n.to_string()).collect(),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ActionExecutor for FakeExecutor {
        async fn execute(&self, ctx: &ActionContext) -> anyhow::Result<ActionOutput> {
            self.calls.lock().unwrap().push(ctx.action.name.clone());
            if self.failing.contains(&ctx.action.name) {
                bail!("{} exploded", ctx.action.name);
            }

            let mut output = ActionOutput::default();
            for name in &ctx.action.outputs {
                output = output.with_artifact(ArtifactHandle::new(name, &ctx.action.name));
            }
            for name in &ctx.action.variables {
                output = output.with_variable(name, format!("{}-value", name));
            }
            Ok(output)
        }
    }

    fn engine(executor: Arc<FakeExecutor>) -> PipelineEngine {
        PipelineEngine::new(
            executor,
            Arc::new(ApprovalGate::default()),
            &RunnerConfig::default(),
        )
    }

    fn linear_pipeline() -> Pipeline {
        Pipeline::new("linear")
            .with_stage(
                Stage::new("Source").with_action(
                    Action::new("Source", ActionKind::Source)
                        .with_namespace("SourceVariables")
                        .with_output("source")
                        .with_variable("BranchName"),
                ),
            )
            .with_stage(
                Stage::new("Build").with_action(
                    Action::new("Build", ActionKind::Build)
                        .with_input("source")
                        .with_env("GIT_BRANCH", EnvValue::reference("SourceVariables", "BranchName")),
                ),
            )
            .with_stage(Stage::new("Test").with_action(Action::new("Test", ActionKind::Test)))
    }

    #[tokio::test]
    async fn test_linear_pipeline_succeeds() {
        let executor = Arc::new(FakeExecutor::default());
        let result = engine(executor.clone()).run(&linear_pipeline()).await.unwrap();

        assert!(result.is_success());
        assert!(result.failure.is_none());
        assert_eq!(executor.calls(), vec!["Source", "Build", "Test"]);
        assert_eq!(result.history.len(), 3);
        assert!(result.history.iter().all(|r| r.outcome.is_success()));
    }

    #[tokio::test]
    async fn test_failure_halts_later_stages() {
        let executor = Arc::new(FakeExecutor::failing(&["Build"]));
        let result = engine(executor.clone()).run(&linear_pipeline()).await.unwrap();

        assert_eq!(result.status, RunStatus::Failed);
        assert_eq!(result.failed_stage(), Some("Build"));
        let failure = result.failure.as_ref().unwrap();
        assert_eq!(failure.kind, FailureKind::ActionFailure);
        assert!(failure.message.contains("Build exploded"));

        assert_eq!(executor.calls(), vec!["Source", "Build"]);
        assert!(!result.stage_started("Test"));
    }

    #[tokio::test]
    async fn test_definition_error_starts_nothing() {
        let executor = Arc::new(FakeExecutor::default());
        let pipeline = Pipeline::new("broken").with_stage(
            Stage::new("Deploy").with_action(
                Action::new("Deploy", ActionKind::Deploy)
                    .with_env("PATH", EnvValue::reference("BuildVariables", "ARTIFACTS_PATH")),
            ),
        );

        let err = engine(executor.clone()).run(&pipeline).await.unwrap_err();
        assert!(matches!(err, DefinitionError::UnresolvedReference { .. }));
        assert!(executor.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_variable_is_resolution_error() {
        /// Succeeds but never emits variables
        struct SilentExecutor;

        #[async_trait]
        impl ActionExecutor for SilentExecutor {
            async fn execute(&self, ctx: &ActionContext) -> anyhow::Result<ActionOutput> {
                let mut output = ActionOutput::default();
                for name in &ctx.action.outputs {
                    output = output.with_artifact(ArtifactHandle::new(name, &ctx.action.name));
                }
                Ok(output)
            }
        }

        let engine = PipelineEngine::new(
            Arc::new(SilentExecutor),
            Arc::new(ApprovalGate::default()),
            &RunnerConfig::default(),
        );
        let result = engine.run(&linear_pipeline()).await.unwrap();

        let failure = result.failure.unwrap();
        assert_eq!(failure.stage, "Build");
        assert_eq!(failure.kind, FailureKind::ResolutionError);
        assert!(failure.message.contains("SourceVariables.BranchName"));
    }

    #[tokio::test]
    async fn test_run_order_groups_are_sequential() {
        let executor = Arc::new(FakeExecutor::default());
        let pipeline = Pipeline::new("ordered").with_stage(
            Stage::new("Deploy")
                .with_action(Action::new("Migrate", ActionKind::Deploy).with_run_order(2))
                .with_action(Action::new("Smoke", ActionKind::Test).with_run_order(3))
                .with_action(Action::new("Provision", ActionKind::Deploy).with_run_order(1)),
        );

        let result = engine(executor.clone()).run(&pipeline).await.unwrap();
        assert!(result.is_success());
        assert_eq!(executor.calls(), vec!["Provision", "Migrate", "Smoke"]);
    }

    #[tokio::test]
    async fn test_same_run_order_runs_concurrently() {
        /// Both actions must be in flight at once to get past the barrier
        struct BarrierExecutor(tokio::sync::Barrier);

        #[async_trait]
        impl ActionExecutor for BarrierExecutor {
            async fn execute(&self, _ctx: &ActionContext) -> anyhow::Result<ActionOutput> {
                self.0.wait().await;
                Ok(ActionOutput::default())
            }
        }

        let engine = PipelineEngine::new(
            Arc::new(BarrierExecutor(tokio::sync::Barrier::new(2))),
            Arc::new(ApprovalGate::default()),
            &RunnerConfig::default(),
        );
        let pipeline = Pipeline::new("parallel").with_stage(
            Stage::new("Test")
                .with_action(Action::new("Unit", ActionKind::Test))
                .with_action(Action::new("Lint", ActionKind::Test)),
        );

        let result = tokio::time::timeout(Duration::from_secs(5), engine.run(&pipeline))
            .await
            .expect("actions in the same group should run concurrently")
            .unwrap();
        assert!(result.is_success());
    }

    #[tokio::test]
    async fn test_failed_group_stops_later_groups_in_stage() {
        let executor = Arc::new(FakeExecutor::failing(&["Provision"]));
        let pipeline = Pipeline::new("ordered").with_stage(
            Stage::new("Deploy")
                .with_action(Action::new("Provision", ActionKind::Deploy).with_run_order(1))
                .with_action(Action::new("Migrate", ActionKind::Deploy).with_run_order(2)),
        );

        let result = engine(executor.clone()).run(&pipeline).await.unwrap();
        assert_eq!(result.status, RunStatus::Failed);
        assert_eq!(executor.calls(), vec!["Provision"]);
        assert!(result.record("Deploy", "Migrate").is_none());
    }

    #[tokio::test]
    async fn test_sibling_finishing_after_failure_is_discarded() {
        /// Fails `Smoke` at once; `Package` succeeds only after a delay
        #[derive(Default)]
        struct SlowSiblingExecutor {
            calls: Mutex<Vec<String>>,
        }

        #[async_trait]
        impl ActionExecutor for SlowSiblingExecutor {
            async fn execute(&self, ctx: &ActionContext) -> anyhow::Result<ActionOutput> {
                self.calls.lock().unwrap().push(ctx.action.name.clone());
                match ctx.action.name.as_str() {
                    "Smoke" => bail!("smoke test failed"),
                    "Package" => {
                        tokio::time::sleep(Duration::from_millis(100)).await;
                        Ok(ActionOutput::default().with_variable("PACKAGE_URI", "s3://bucket/app.zip"))
                    }
                    _ => Ok(ActionOutput::default()),
                }
            }
        }

        let executor = Arc::new(SlowSiblingExecutor::default());
        let engine = PipelineEngine::new(
            executor.clone(),
            Arc::new(ApprovalGate::default()),
            &RunnerConfig::default(),
        );
        let stage = Stage::new("Deploy")
            .with_action(
                Action::new("Package", ActionKind::Build)
                    .with_namespace("PackageVariables")
                    .with_variable("PACKAGE_URI"),
            )
            .with_action(Action::new("Smoke", ActionKind::Test))
            .with_action(Action::new("Publish", ActionKind::Deploy).with_run_order(2));

        let store = Arc::new(RunStore::new());
        let history = RunHistory::new();
        let failure = engine
            .run_stage(Uuid::new_v4(), &stage, &store, &history)
            .await
            .unwrap_err();

        assert_eq!(failure.action, "Smoke");
        assert_eq!(failure.kind, FailureKind::ActionFailure);

        let records = history.snapshot();
        let package = records.iter().find(|r| r.action == "Package").unwrap();
        assert_eq!(package.outcome, ActionOutcome::Discarded);

        assert!(!store.is_published("PackageVariables"));
        assert!(matches!(
            store.variable(&VariableRef::new("PackageVariables", "PACKAGE_URI")),
            Err(StoreError::MissingVariable(_))
        ));

        assert!(records.iter().all(|r| r.action != "Publish"));
        assert!(!executor.calls.lock().unwrap().contains(&"Publish".to_string()));
    }

    #[tokio::test]
    async fn test_pending_approval_is_discarded_when_sibling_fails() {
        /// Records the request and wakes the failing sibling
        struct OpenedNotifier {
            opened: Arc<Notify>,
            request: Mutex<Option<Uuid>>,
        }

        #[async_trait]
        impl ApprovalNotifier for OpenedNotifier {
            async fn notify(&self, request: &ApprovalRequest) -> anyhow::Result<()> {
                *self.request.lock().unwrap() = Some(request.id);
                self.opened.notify_one();
                Ok(())
            }
        }

        /// Fails once the approval has been requested
        struct FailAfterOpen(Arc<Notify>);

        #[async_trait]
        impl ActionExecutor for FailAfterOpen {
            async fn execute(&self, ctx: &ActionContext) -> anyhow::Result<ActionOutput> {
                self.0.notified().await;
                bail!("{} failed", ctx.action.name)
            }
        }

        let opened = Arc::new(Notify::new());
        let notifier = Arc::new(OpenedNotifier {
            opened: Arc::clone(&opened),
            request: Mutex::new(None),
        });
        let gate = Arc::new(ApprovalGate::new(notifier.clone()));
        let engine = PipelineEngine::new(
            Arc::new(FailAfterOpen(opened)),
            Arc::clone(&gate),
            &RunnerConfig::default(),
        );
        let pipeline = Pipeline::new("gated").with_stage(
            Stage::new("Release")
                .with_action(Action::new("Review", ActionKind::Approval))
                .with_action(Action::new("Smoke", ActionKind::Test))
                .with_action(Action::new("Ship", ActionKind::Deploy).with_run_order(2)),
        );

        let result = tokio::time::timeout(Duration::from_secs(5), engine.run(&pipeline))
            .await
            .expect("a failed sibling should stop the approval wait")
            .unwrap();

        let failure = result.failure.as_ref().unwrap();
        assert_eq!(failure.action, "Smoke");
        assert_eq!(
            result.record("Release", "Review").unwrap().outcome,
            ActionOutcome::Discarded
        );
        assert!(result.record("Release", "Ship").is_none());

        let request = notifier.request.lock().unwrap().unwrap();
        assert!(gate.get(request).is_none());
        assert!(gate.list(None).is_empty());
        assert!(matches!(
            gate.resolve(request, ApprovalDecision::Approve, None, None),
            Err(crate::GateError::NotFound(_))
        ));
    }

    #[test]
    fn test_check_outputs_filters_undeclared() {
        let action = Action::new("Build", ActionKind::Build)
            .with_output("build")
            .with_variable("ARTIFACTS_PATH");

        let output = ActionOutput::default()
            .with_artifact(ArtifactHandle::new("build", "Build"))
            .with_artifact(ArtifactHandle::new("extra", "Build"))
            .with_variable("ARTIFACTS_PATH", "s3://x")
            .with_variable("SECRET", "nope");

        let checked = check_outputs("Build", &action, output).unwrap();
        assert_eq!(checked.artifacts.len(), 1);
        assert_eq!(checked.variables.len(), 1);
        assert_eq!(checked.variables["ARTIFACTS_PATH"], "s3://x");
    }

    #[test]
    fn test_check_outputs_requires_declared_artifacts() {
        let action = Action::new("Build", ActionKind::Build).with_output("build");
        let (kind, message) = check_outputs("Build", &action, ActionOutput::default()).unwrap_err();
        assert_eq!(kind, FailureKind::ActionFailure);
        assert!(message.contains("'build'"));
    }
}
