//! Application state management

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use uuid::Uuid;

use super::ServerConfig;

/// Application state shared across handlers
pub struct AppState {
    pub config: ServerConfig,
    pub started_at: chrono::DateTime<chrono::Utc>,
    search_permits: Arc<Semaphore>,
    searches_completed: AtomicU64,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let permits = config.max_concurrent_searches;
        Self {
            config,
            started_at: chrono::Utc::now(),
            search_permits: Arc::new(Semaphore::new(permits)),
            searches_completed: AtomicU64::new(0),
        }
    }

    pub fn generate_id() -> String {
        Uuid::new_v4().to_string()[..8].to_string()
    }

    /// Claim a search slot without waiting
    pub fn try_acquire_search(&self) -> Option<OwnedSemaphorePermit> {
        Arc::clone(&self.search_permits).try_acquire_owned().ok()
    }

    pub fn available_searches(&self) -> usize {
        self.search_permits.available_permits()
    }

    pub fn record_completed(&self) {
        self.searches_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn searches_completed(&self) -> u64 {
        self.searches_completed.load(Ordering::Relaxed)
    }
}
