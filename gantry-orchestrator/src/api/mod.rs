//! API Module
//!
//! HTTP API layer for the orchestrator.
//! Each submodule handles endpoints for a specific domain.

pub mod approval;
pub mod error;
pub mod health;
pub mod hook;
pub mod run;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Create the main API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Run endpoints
        .route("/api/runs", post(run::start_run).get(run::list_runs))
        .route("/api/runs/lua", post(run::start_lua_run))
        .route("/api/runs/{id}", get(run::get_run))
        // Approval endpoints
        .route("/api/approvals", get(approval::list_approvals))
        .route("/api/approvals/{id}", get(approval::get_approval))
        .route(
            "/api/approvals/{id}/resolve",
            post(approval::resolve_approval),
        )
        // Lifecycle hooks
        .route("/api/hooks/pre-traffic", post(hook::pre_traffic))
        // Add state and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Json,
        extract::{Path, Query, State},
        http::StatusCode,
    };
    use gantry_canary::{
        CanaryConfig, CanaryHook, HookError, InMemoryStore, LifecycleReporter, LocalInvoker,
        LogReporter,
    };
    use gantry_core::domain::action::{Action, ActionKind};
    use gantry_core::domain::approval::{ApprovalDecision, ApprovalState};
    use gantry_core::domain::canary::{LifecycleEvent, Verdict};
    use gantry_core::domain::pipeline::{Pipeline, Stage};
    use gantry_core::domain::run::RunStatus;
    use gantry_core::dto::approval::ResolveApproval;
    use gantry_core::dto::run::{StartLuaRun, StartRun};
    use gantry_runner::{ApprovalGate, PipelineEngine, ProcessExecutor, RunnerConfig};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::io::AsyncWriteExt;
    use uuid::Uuid;

    use crate::api::approval::ApprovalQuery;
    use crate::api::error::ApiError;
    use crate::service::run::RunRegistry;

    struct DownReporter;

    #[async_trait::async_trait]
    impl LifecycleReporter for DownReporter {
        async fn report(
            &self,
            _event: &LifecycleEvent,
            _verdict: Verdict,
        ) -> gantry_canary::Result<()> {
            Err(HookError::Reporting("connection refused".into()))
        }
    }

    /// Counts the verdicts it receives
    #[derive(Default)]
    struct CountingReporter {
        reports: AtomicUsize,
    }

    impl CountingReporter {
        fn reports(&self) -> usize {
            self.reports.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl LifecycleReporter for CountingReporter {
        async fn report(
            &self,
            _event: &LifecycleEvent,
            _verdict: Verdict,
        ) -> gantry_canary::Result<()> {
            self.reports.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn state_with_reporter(reporter: Arc<dyn LifecycleReporter>) -> AppState {
        state_with(reporter, Duration::from_millis(20))
    }

    fn state_with(reporter: Arc<dyn LifecycleReporter>, settle: Duration) -> AppState {
        let base = std::env::temp_dir().join(format!("gantry-api-{}", Uuid::new_v4()));
        let runner = RunnerConfig::new(base);
        let engine = PipelineEngine::new(
            Arc::new(ProcessExecutor::new(&runner)),
            Arc::new(ApprovalGate::default()),
            &runner,
        );

        let store = Arc::new(InMemoryStore::new());
        let hook = CanaryHook::new(
            CanaryConfig::new("put-book:2").with_settle(settle),
            Arc::new(LocalInvoker::new(store.clone(), "books")),
            store,
            reporter,
        );

        AppState::new(engine, RunRegistry::new(), hook)
    }

    fn state() -> AppState {
        state_with_reporter(Arc::new(LogReporter))
    }

    fn gated_pipeline() -> Pipeline {
        Pipeline::new("gated").with_stage(
            Stage::new("Release")
                .with_action(Action::new("Review", ActionKind::Approval).with_rationale("ship it?"))
                .with_action(Action::new("Ship", ActionKind::Deploy).with_run_order(2)),
        )
    }

    async fn wait_for_status(state: &AppState, id: Uuid, status: RunStatus) {
        for _ in 0..200 {
            if state.runs.get(id).unwrap().summary.status == status {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("run {} never reached {}", id, status);
    }

    #[tokio::test]
    async fn test_router_builds() {
        let _router = create_router(state());
    }

    #[tokio::test]
    async fn test_start_run_returns_created() {
        let state = state();
        let pipeline = Pipeline::new("noop")
            .with_stage(Stage::new("Test").with_action(Action::new("Test", ActionKind::Test)));

        let (status, Json(summary)) =
            run::start_run(State(state.clone()), Json(StartRun { pipeline }))
                .await
                .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        wait_for_status(&state, summary.id, RunStatus::Succeeded).await;

        let Json(runs) = run::list_runs(State(state.clone())).await;
        assert_eq!(runs.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_definition_is_bad_request() {
        let err = run::start_run(
            State(state()),
            Json(StartRun {
                pipeline: Pipeline::new("empty"),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));

        let err = run::start_lua_run(
            State(state()),
            Json(StartLuaRun {
                script: "return { name = 'x', stages = { { name = 'A', actions = {} } } }".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_unknown_run_is_not_found() {
        let err = run::get_run(State(state()), Path(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_approval_resolution_through_api() {
        let state = state();
        let (_, Json(summary)) = run::start_run(
            State(state.clone()),
            Json(StartRun {
                pipeline: gated_pipeline(),
            }),
        )
        .await
        .unwrap();

        let mut pending = Vec::new();
        for _ in 0..200 {
            let Json(list) = approval::list_approvals(
                State(state.clone()),
                Query(ApprovalQuery {
                    state: Some(ApprovalState::Pending),
                }),
            )
            .await;
            if !list.is_empty() {
                pending = list;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(pending.len(), 1);
        let id = pending[0].id;
        assert_eq!(pending[0].rationale.as_deref(), Some("ship it?"));

        let Json(resolved) = approval::resolve_approval(
            State(state.clone()),
            Path(id),
            Json(ResolveApproval {
                decision: ApprovalDecision::Reject,
                resolved_by: Some("alice".to_string()),
                comment: Some("not today".to_string()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(resolved.state, ApprovalState::Rejected);

        let err = approval::resolve_approval(
            State(state.clone()),
            Path(id),
            Json(ResolveApproval {
                decision: ApprovalDecision::Approve,
                resolved_by: None,
                comment: None,
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));

        wait_for_status(&state, summary.id, RunStatus::Failed).await;
        let Json(details) = run::get_run(State(state.clone()), Path(summary.id))
            .await
            .unwrap();
        assert_eq!(details.summary.failure.unwrap().action, "Review");
        assert!(!details.history.iter().any(|r| r.action == "Ship"));
    }

    #[tokio::test]
    async fn test_unknown_approval_is_not_found() {
        let err = approval::resolve_approval(
            State(state()),
            Path(Uuid::new_v4()),
            Json(ResolveApproval {
                decision: ApprovalDecision::Approve,
                resolved_by: None,
                comment: None,
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_pre_traffic_hook() {
        let Json(report) = hook::pre_traffic(
            State(state()),
            Json(LifecycleEvent::new("d-1", "exec-1")),
        )
        .await
        .unwrap();
        assert_eq!(report.verdict, Verdict::Succeeded);
    }

    #[tokio::test]
    async fn test_pre_traffic_reporting_failure_is_bad_gateway() {
        let err = hook::pre_traffic(
            State(state_with_reporter(Arc::new(DownReporter))),
            Json(LifecycleEvent::new("d-1", "exec-1")),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::BadGateway(_)));
    }

    #[tokio::test]
    async fn test_pre_traffic_reports_after_caller_gives_up() {
        let reporter = Arc::new(CountingReporter::default());
        let state = state_with(reporter.clone(), Duration::from_millis(200));

        let handler = hook::pre_traffic(State(state), Json(LifecycleEvent::new("d-1", "exec-1")));
        // Dropping the handler future is what a disconnect does to it
        let gave_up = tokio::time::timeout(Duration::from_millis(50), handler).await;
        assert!(gave_up.is_err());

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(reporter.reports(), 1);
    }

    #[tokio::test]
    async fn test_pre_traffic_reports_after_client_disconnects() {
        let reporter = Arc::new(CountingReporter::default());
        let state = state_with(reporter.clone(), Duration::from_millis(200));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, create_router(state)).await.unwrap();
        });

        let body = r#"{"DeploymentId":"d-1","LifecycleEventHookExecutionId":"exec-1"}"#;
        let request = format!(
            "POST /api/hooks/pre-traffic HTTP/1.1\r\nHost: {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
            addr,
            body.len(),
            body
        );

        let mut socket = tokio::net::TcpStream::connect(addr).await.unwrap();
        socket.write_all(request.as_bytes()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        drop(socket);

        tokio::time::sleep(Duration::from_millis(800)).await;
        assert_eq!(reporter.reports(), 1);
    }
}
