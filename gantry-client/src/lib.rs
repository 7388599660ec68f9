//! Gantry HTTP Client
//!
//! A simple, type-safe HTTP client for the Gantry orchestrator API, used by
//! the CLI.
//!
//! # Example
//!
//! ```no_run
//! use gantry_client::OrchestratorClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = OrchestratorClient::new("http://gantry.internal:8080");
//!
//!     for run in client.list_runs().await? {
//!         println!("{} {} {}", run.id, run.pipeline, run.status);
//!     }
//!     Ok(())
//! }
//! ```

mod approvals;
pub mod error;
mod hooks;
mod runs;

pub use error::{ClientError, Result};

use reqwest::Client;
use serde::de::DeserializeOwned;

/// Typed handle on the orchestrator's HTTP API
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct OrchestratorClient {
    /// Orchestrator root without a trailing slash, e.g. `http://localhost:8080`
    base_url: String,
    client: Client,
}

impl OrchestratorClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Uses a preconfigured `reqwest::Client` (timeouts, proxies, TLS)
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url, client }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Succeeds when the orchestrator answers its health check
    pub async fn health(&self) -> Result<()> {
        let response = self.client.get(self.endpoint("/health")).send().await?;
        check_status(response).await.map(drop)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Turns non-2xx answers into `ClientError::ApiError`
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ClientError::api_error(status.as_u16(), body))
}

/// Checks the status, then decodes the JSON body
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    check_status(response)
        .await?
        .json()
        .await
        .map_err(|e| ClientError::ParseError(e.to_string()))
}
