use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod api;
pub mod config;
pub mod service;
pub mod state;

use crate::config::OrchestratorConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "gantry_orchestrator=debug,gantry_runner=info,gantry_canary=info,tower_http=debug"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Gantry Orchestrator...");

    let config = OrchestratorConfig::from_env().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config from environment: {:#}", e);
        tracing::info!("Using default configuration");
        OrchestratorConfig::default()
    });
    config.validate()?;

    if config.is_local() {
        tracing::info!("Canary hook running in local mode");
    }
    tracing::info!(
        "Action workspace: {} (max {} parallel actions)",
        config.runner.workspace_base.display(),
        config.runner.max_parallel_actions
    );

    let state = AppState::from_config(&config)?;

    // Build router with all API endpoints
    let app = api::create_router(state);

    tracing::info!("Listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
