//! Pre-traffic canary hook
//!
//! Protocol, one sequential pass per deployment attempt:
//! 1. Invoke the candidate with a batch carrying the sentinel book
//! 2. Wait the settle interval
//! 3. Read the sentinel key back with a consistent read
//! 4. Verdict: Succeeded if present, Failed otherwise
//! 5. Delete the sentinel record, whatever the verdict
//! 6. Report the verdict to the deployment controller
//!
//! Any fault in steps 1-4 becomes a Failed verdict. Only a reporting
//! failure is returned as an error.

use chrono::Utc;
use gantry_core::domain::canary::{CanaryCheck, CanaryReport, LifecycleEvent, Verdict};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::config::CanaryConfig;
use crate::error::{HookError, Result};
use crate::invoker::CandidateInvoker;
use crate::reporter::LifecycleReporter;
use crate::store::ConsistencyStore;
use crate::workload::{Book, RecordBatch};

/// Pre-traffic validation hook
pub struct CanaryHook {
    config: CanaryConfig,
    invoker: Arc<dyn CandidateInvoker>,
    store: Arc<dyn ConsistencyStore>,
    reporter: Arc<dyn LifecycleReporter>,
}

impl CanaryHook {
    pub fn new(
        config: CanaryConfig,
        invoker: Arc<dyn CandidateInvoker>,
        store: Arc<dyn ConsistencyStore>,
        reporter: Arc<dyn LifecycleReporter>,
    ) -> Self {
        Self {
            config,
            invoker,
            store,
            reporter,
        }
    }

    pub fn config(&self) -> &CanaryConfig {
        &self.config
    }

    /// Runs the check for one lifecycle event and reports its verdict
    ///
    /// # Errors
    /// Returns `HookError::Reporting` when the verdict could not be
    /// delivered. The sentinel record has been cleaned up by then.
    pub async fn handle(&self, event: LifecycleEvent) -> Result<CanaryReport> {
        info!(
            "Entering pre-traffic hook (deployment {}, execution {})",
            event.deployment_id, event.hook_execution_id
        );
        info!("Testing candidate version {}", self.config.candidate_version);

        let key = self.config.sentinel_mode.key(&event.hook_execution_id);
        let book = Book::sentinel(&key);
        let payload = serde_json::to_value(&book).unwrap_or(Value::Null);

        let mut check = CanaryCheck::new(&self.config.candidate_version, &key, payload);

        let (verdict, reason) = match self.validate(&book).await {
            Ok(()) => (Verdict::Succeeded, None),
            Err(e) => {
                warn!("Canary check for {} failed: {}", key, e);
                (Verdict::Failed, Some(e.to_string()))
            }
        };

        let cleanup_error = self.cleanup(&key).await;
        check.conclude(verdict, reason);

        info!(
            "Verdict for deployment {}: {}",
            event.deployment_id, verdict
        );

        self.reporter.report(&event, verdict).await.map_err(|e| {
            error!(
                "Could not report verdict for deployment {}: {}",
                event.deployment_id, e
            );
            match e {
                HookError::Reporting(_) => e,
                other => HookError::Reporting(other.to_string()),
            }
        })?;

        Ok(CanaryReport {
            event,
            check,
            verdict,
            cleanup_error,
            completed_at: Utc::now(),
        })
    }

    /// Steps 1-4; `Ok` means the sentinel record was found
    async fn validate(&self, book: &Book) -> Result<()> {
        let batch = serde_json::to_value(RecordBatch::single(book)?)?;
        debug!("Invocation payload: {}", batch);

        self.invoker
            .invoke(&self.config.candidate_version, &batch)
            .await
            .map_err(|e| match e {
                HookError::Invocation(_) => e,
                other => HookError::Invocation(other.to_string()),
            })?;

        tokio::time::sleep(self.config.settle).await;

        let mut attempt = 0;
        loop {
            let item = self
                .store
                .get_consistent(&self.config.table, &book.isbn)
                .await
                .map_err(|e| match e {
                    HookError::Store { .. } => e,
                    other => HookError::store("read", other.to_string()),
                })?;

            if let Some(item) = item {
                info!("Sentinel record found: {}", item);
                return Ok(());
            }

            if attempt >= self.config.consistency_retries {
                return Err(HookError::RecordNotFound(book.isbn.clone()));
            }

            let backoff = self.config.backoff_for(attempt);
            debug!(
                "Sentinel record {} not visible yet, retrying in {:?}",
                book.isbn, backoff
            );
            tokio::time::sleep(backoff).await;
            attempt += 1;
        }
    }

    /// Best-effort delete; the error is returned for the report, never raised
    async fn cleanup(&self, key: &str) -> Option<String> {
        match self.store.delete(&self.config.table, key).await {
            Ok(()) => {
                info!("Sentinel record {} deleted", key);
                None
            }
            Err(e) => {
                warn!("Failed to delete sentinel record {}: {}", key, e);
                Some(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoker::LocalInvoker;
    use crate::store::InMemoryStore;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingReporter {
        reports: Mutex<Vec<(String, Verdict)>>,
    }

    #[async_trait]
    impl LifecycleReporter for RecordingReporter {
        async fn report(&self, event: &LifecycleEvent, verdict: Verdict) -> Result<()> {
            self.reports
                .lock()
                .unwrap()
                .push((event.hook_execution_id.clone(), verdict));
            Ok(())
        }
    }

    /// Invoker that accepts but never runs anything
    struct NoopInvoker;

    #[async_trait]
    impl CandidateInvoker for NoopInvoker {
        async fn invoke(&self, _version: &str, _payload: &Value) -> Result<()> {
            Ok(())
        }
    }

    fn config() -> CanaryConfig {
        CanaryConfig::new("put-book:2").with_settle(Duration::from_millis(20))
    }

    #[tokio::test]
    async fn test_records_check_details() {
        let store = Arc::new(InMemoryStore::new());
        let reporter = Arc::new(RecordingReporter::default());
        let hook = CanaryHook::new(
            config(),
            Arc::new(LocalInvoker::new(store.clone(), "books")),
            store.clone(),
            reporter.clone(),
        );

        let report = hook
            .handle(LifecycleEvent::new("d-1", "exec-1"))
            .await
            .unwrap();

        assert_eq!(report.verdict, Verdict::Succeeded);
        assert_eq!(report.check.candidate_version, "put-book:2");
        assert_eq!(report.check.sentinel_key, "1-111-111-111#exec-1");
        assert_eq!(report.check.payload["title"], "Test");
        assert_eq!(report.check.verdict, Some(Verdict::Succeeded));
        assert!(report.cleanup_error.is_none());
        assert_eq!(
            *reporter.reports.lock().unwrap(),
            vec![("exec-1".to_string(), Verdict::Succeeded)]
        );
    }

    #[tokio::test]
    async fn test_missing_record_retries_then_fails() {
        let store = Arc::new(InMemoryStore::new());
        let reporter = Arc::new(RecordingReporter::default());
        let hook = CanaryHook::new(
            config().with_consistency_retries(2, Duration::from_millis(5)),
            Arc::new(NoopInvoker),
            store,
            reporter.clone(),
        );

        let report = hook
            .handle(LifecycleEvent::new("d-1", "exec-2"))
            .await
            .unwrap();

        assert_eq!(report.verdict, Verdict::Failed);
        assert!(report.check.reason.unwrap().contains("not found"));
        assert_eq!(reporter.reports.lock().unwrap().len(), 1);
    }
}
