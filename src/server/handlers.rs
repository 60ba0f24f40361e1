//! HTTP request handlers

use std::sync::Arc;
use std::time::Instant;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::optimizer::{
    OptimizeDirection, Problem, ProblemConfig, ResultPayload, SearchSpace, SlimeMould, SmaConfig,
};

use super::error::{Result, ServerError};
use super::state::AppState;

/// Body of `POST /api/optimize`; omitted fields take the optimizer defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptimizeRequest {
    pub epoch: Option<usize>,
    pub pop_size: Option<usize>,
    pub p_t: Option<f64>,
    pub random_state: Option<u64>,
    /// "max" (default) or "min"
    pub minmax: Option<OptimizeDirection>,
}

impl OptimizeRequest {
    pub fn to_config(&self) -> SmaConfig {
        let defaults = SmaConfig::default();
        SmaConfig {
            epoch: self.epoch.unwrap_or(defaults.epoch),
            pop_size: self.pop_size.unwrap_or(defaults.pop_size),
            p_t: self.p_t.unwrap_or(defaults.p_t),
            random_state: self.random_state.or(defaults.random_state),
        }
    }
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let uptime = chrono::Utc::now().signed_duration_since(state.started_at);
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": uptime.num_seconds(),
        "available_searches": state.available_searches(),
        "searches_completed": state.searches_completed(),
    }))
}

pub async fn get_search_space() -> Json<serde_json::Value> {
    let space = SearchSpace::sgd_default();
    Json(serde_json::json!({
        "bounds": space.bounds(),
        "defaults": SmaConfig::default(),
    }))
}

/// Run one slime mould search over the configured dataset
pub async fn run_optimize(
    State(state): State<Arc<AppState>>,
    Json(request): Json<OptimizeRequest>,
) -> Result<Json<ResultPayload>> {
    let config = request.to_config();
    config.validate()?;

    let evaluations = config.n_evaluations();
    if evaluations > state.config.max_evaluations {
        return Err(ServerError::BadRequest(format!(
            "pop_size * (epoch + 1) = {} exceeds the limit of {}",
            evaluations, state.config.max_evaluations
        )));
    }

    let permit = state
        .try_acquire_search()
        .ok_or_else(|| ServerError::Busy("All search slots are in use, retry later".to_string()))?;

    let search_id = AppState::generate_id();
    let dataset = state.config.dataset.clone();
    let minmax = request.minmax.unwrap_or_default();
    info!(
        search_id = %search_id,
        minmax = ?minmax,
        epoch = config.epoch,
        pop_size = config.pop_size,
        evaluations,
        "Search accepted"
    );

    let start = Instant::now();
    let result = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        let data = Arc::new(dataset.load()?);
        let problem = Problem::from_config(ProblemConfig::new().with_data(data).with_minmax(minmax))?;
        let optimizer = SlimeMould::new(config)?;
        Ok::<_, crate::error::TunerError>(optimizer.solve(&problem))
    })
    .await
    .map_err(|e| ServerError::Internal(format!("search task failed: {}", e)))??;

    state.record_completed();
    info!(
        search_id = %search_id,
        best_fitness = result.best_fitness,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Search complete"
    );

    Ok(Json(result.payload()))
}
