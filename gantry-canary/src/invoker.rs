//! Candidate invoker
//!
//! Invokes one specific deployed version directly, bypassing the normal
//! traffic-routing entry point. Invocation is asynchronous: the call returns
//! once the invocation is accepted, not when the candidate finishes.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::error::{HookError, Result};
use crate::store::ConsistencyStore;
use crate::workload::{RecordBatch, put_book};

#[async_trait]
pub trait CandidateInvoker: Send + Sync {
    async fn invoke(&self, version: &str, payload: &Value) -> Result<()>;
}

/// Invoker for a function runtime reachable over HTTP
///
/// Posts the payload to `{base}/functions/{version}/invocations` with
/// `X-Invocation-Type: Event`.
#[derive(Debug, Clone)]
pub struct HttpInvoker {
    base_url: Url,
    client: Client,
}

impl HttpInvoker {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_client(base_url, Client::new())
    }

    pub fn with_client(base_url: &str, client: Client) -> Result<Self> {
        let base_url = Url::parse(base_url.trim_end_matches('/')).map_err(|e| {
            HookError::Config(format!("invalid invoke URL '{}': {}", base_url, e))
        })?;
        Ok(Self { base_url, client })
    }

    fn invocation_url(&self, version: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| HookError::Config("invoke URL cannot be used as a base".to_string()))?
            .pop_if_empty()
            .extend(["functions", version, "invocations"]);
        Ok(url)
    }
}

#[async_trait]
impl CandidateInvoker for HttpInvoker {
    async fn invoke(&self, version: &str, payload: &Value) -> Result<()> {
        let response = self
            .client
            .post(self.invocation_url(version)?)
            .header("X-Invocation-Type", "Event")
            .json(payload)
            .send()
            .await
            .map_err(|e| HookError::Invocation(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HookError::Invocation(format!("{}: {}", status, body)));
        }

        debug!("Invocation of {} accepted ({})", version, status);
        Ok(())
    }
}

/// Runs the put-book workload in process as the candidate
///
/// Each invocation is detached; an optional delay models a write that
/// becomes visible late.
pub struct LocalInvoker {
    store: Arc<dyn ConsistencyStore>,
    table: String,
    delay: Duration,
}

impl LocalInvoker {
    pub fn new(store: Arc<dyn ConsistencyStore>, table: impl Into<String>) -> Self {
        Self {
            store,
            table: table.into(),
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl CandidateInvoker for LocalInvoker {
    async fn invoke(&self, version: &str, payload: &Value) -> Result<()> {
        let batch: RecordBatch = serde_json::from_value(payload.clone())
            .map_err(|e| HookError::Invocation(format!("payload is not a record batch: {}", e)))?;

        let store = Arc::clone(&self.store);
        let table = self.table.clone();
        let delay = self.delay;
        let version = version.to_string();

        info!("Invoking local candidate {} (delay {:?})", version, delay);

        tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if let Err(e) = put_book(store.as_ref(), &table, &batch).await {
                error!("Local candidate {} failed: {}", version, e);
            }
        });

        Ok(())
    }
}
