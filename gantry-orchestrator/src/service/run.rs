//! Run registry
//!
//! Tracks every run started through the API. A run is validated before it
//! is registered, then executed in a background task; its history is
//! visible while it is still running.
//!
//! Finished runs are retained up to `retention`; when a run finishes past
//! that limit the earliest-completed runs are forgotten. Running entries
//! are never evicted.

use chrono::{DateTime, Utc};
use gantry_core::DefinitionError;
use gantry_core::domain::pipeline::Pipeline;
use gantry_core::domain::run::{PipelineResult, RunStatus, StageFailure};
use gantry_core::dto::run::{RunDetails, RunSummary};
use gantry_runner::{PipelineEngine, RunHistory};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use uuid::Uuid;

struct RunEntry {
    pipeline: String,
    status: RunStatus,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    failure: Option<StageFailure>,
    history: Arc<RunHistory>,
}

impl RunEntry {
    fn summary(&self, id: Uuid) -> RunSummary {
        RunSummary {
            id,
            pipeline: self.pipeline.clone(),
            status: self.status,
            started_at: self.started_at,
            completed_at: self.completed_at,
            failure: self.failure.clone(),
        }
    }
}

/// Finished runs kept when no retention is configured
pub const DEFAULT_RUN_RETENTION: usize = 500;

pub struct RunRegistry {
    runs: RwLock<HashMap<Uuid, RunEntry>>,
    retention: usize,
}

impl RunRegistry {
    pub fn new() -> Self {
        Self::with_retention(DEFAULT_RUN_RETENTION)
    }

    pub fn with_retention(retention: usize) -> Self {
        Self {
            runs: RwLock::new(HashMap::new()),
            retention: retention.max(1),
        }
    }

    /// Validates and starts a run in the background
    ///
    /// # Errors
    /// Returns the definition error; nothing is registered in that case.
    pub fn start(
        self: &Arc<Self>,
        engine: &PipelineEngine,
        pipeline: Pipeline,
    ) -> Result<RunSummary, DefinitionError> {
        pipeline.validate()?;

        let id = Uuid::new_v4();
        let history = Arc::new(RunHistory::new());
        let entry = RunEntry {
            pipeline: pipeline.name.clone(),
            status: RunStatus::Running,
            started_at: Utc::now(),
            completed_at: None,
            failure: None,
            history: Arc::clone(&history),
        };
        let summary = entry.summary(id);

        self.write().insert(id, entry);
        tracing::info!("Run {} of '{}' registered", id, pipeline.name);

        let registry = Arc::clone(self);
        let engine = engine.clone();
        tokio::spawn(async move {
            let outcome = engine.run_with(id, &pipeline, history).await;
            registry.finish(id, outcome);
        });

        Ok(summary)
    }

    fn finish(
        &self,
        id: Uuid,
        outcome: Result<PipelineResult, DefinitionError>,
    ) {
        let mut runs = self.write();
        let Some(entry) = runs.get_mut(&id) else {
            tracing::warn!("Finished run {} is not registered", id);
            return;
        };

        match outcome {
            Ok(result) => {
                entry.status = result.status;
                entry.started_at = result.started_at;
                entry.completed_at = Some(result.completed_at);
                entry.failure = result.failure;
            }
            Err(e) => {
                tracing::error!("Run {} rejected its definition: {}", id, e);
                entry.status = RunStatus::Failed;
                entry.completed_at = Some(Utc::now());
            }
        }

        self.evict_finished(&mut runs);
    }

    fn evict_finished(&self, runs: &mut HashMap<Uuid, RunEntry>) {
        let mut finished: Vec<(Uuid, DateTime<Utc>)> = runs
            .iter()
            .filter_map(|(id, entry)| entry.completed_at.map(|at| (*id, at)))
            .collect();

        if finished.len() <= self.retention {
            return;
        }

        finished.sort_by_key(|(_, completed_at)| *completed_at);
        let excess = finished.len() - self.retention;
        for (id, _) in finished.into_iter().take(excess) {
            runs.remove(&id);
            tracing::debug!("Run {} evicted from the registry", id);
        }
    }

    /// Lists runs, newest first
    pub fn list(&self) -> Vec<RunSummary> {
        let runs = self.read();
        let mut summaries: Vec<RunSummary> =
            runs.iter().map(|(id, entry)| entry.summary(*id)).collect();
        summaries.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        summaries
    }

    pub fn get(&self, id: Uuid) -> Option<RunDetails> {
        self.read().get(&id).map(|entry| RunDetails {
            summary: entry.summary(id),
            history: entry.history.snapshot(),
        })
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<Uuid, RunEntry>> {
        self.runs.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<Uuid, RunEntry>> {
        self.runs.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for RunRegistry {
    fn default() -> Self {
        Self::new()
    }
}
