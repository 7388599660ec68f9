//! Configuration module
//!
//! Settings resolved from flags and the environment at startup.

use gantry_client::OrchestratorClient;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Root URL of the orchestrator API
    pub orchestrator_url: String,
}

impl Config {
    pub fn client(&self) -> OrchestratorClient {
        OrchestratorClient::new(&self.orchestrator_url)
    }
}
