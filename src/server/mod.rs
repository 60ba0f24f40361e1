//! SMA Tuner Server Module
//!
//! REST API that runs slime mould searches against the configured dataset.

mod api;
mod error;
mod handlers;
mod state;

pub use api::create_router;
pub use error::ServerError;
pub use handlers::OptimizeRequest;
pub use state::AppState;

use crate::utils::DatasetConfig;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Dataset loaded for every search request
    pub dataset: DatasetConfig,
    /// Searches allowed to run at once; further requests get 503
    pub max_concurrent_searches: usize,
    /// Upper limit on `pop_size * (epoch + 1)` per request
    pub max_evaluations: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let dataset = match std::env::var("DATASET_PATH") {
            Ok(path) => DatasetConfig::new(path),
            Err(_) => DatasetConfig::default(),
        };

        Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            dataset,
            max_concurrent_searches: search_slots(std::env::var("MAX_CONCURRENT_SEARCHES").ok()),
            max_evaluations: std::env::var("MAX_EVALUATIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10_000),
        }
    }
}

/// At least one search slot; unset or unparsable values give the default of 2
fn search_slots(value: Option<String>) -> usize {
    value
        .and_then(|s| s.trim().parse::<usize>().ok())
        .map_or(2, |n| n.max(1))
}

/// Start the server with the given configuration
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let start_time = chrono::Utc::now();

    if !Path::new(&config.dataset.path).exists() {
        warn!(
            dataset = %config.dataset.path.display(),
            "Dataset not found, optimize requests will fail until it exists"
        );
    }

    let state = Arc::new(AppState::new(config.clone()));
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!(
        address = %addr,
        dataset = %config.dataset.path.display(),
        max_concurrent_searches = config.max_concurrent_searches,
        max_evaluations = config.max_evaluations,
        started_at = %start_time.to_rfc3339(),
        "SMA tuner server starting"
    );
    info!(url = %format!("http://{}/api/health", addr), "Health endpoint available");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %addr, pid = std::process::id(), "Server listening");

    let shutdown_signal = async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Could not listen for ctrl+c");
            return;
        }
        let uptime = chrono::Utc::now().signed_duration_since(start_time);
        info!(uptime_secs = uptime.num_seconds(), "Shutdown signal received, stopping server gracefully");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shut down cleanly");
    Ok(())
}
