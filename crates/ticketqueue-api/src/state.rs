//! Application state shared across all handlers and middleware.

use std::sync::Arc;
use std::time::Instant;

use ticketqueue_auth::JwtDecoder;
use ticketqueue_core::config::AppConfig;
use ticketqueue_inventory::InventoryManager;
use ticketqueue_realtime::QueueEngine;

/// Shared application state passed to every handler via Axum's `State`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Admission hubs, one per tier.
    pub engine: QueueEngine,
    /// Bearer token validation for the HTTP endpoints.
    pub jwt_decoder: Arc<JwtDecoder>,
    /// Inventory the hubs read from.
    pub inventory: InventoryManager,
    /// Process start, for uptime reporting.
    pub started_at: Instant,
}

impl AppState {
    /// Builds the state; the start time is taken now.
    pub fn new(
        config: AppConfig,
        engine: QueueEngine,
        jwt_decoder: Arc<JwtDecoder>,
        inventory: InventoryManager,
    ) -> Self {
        Self {
            config: Arc::new(config),
            engine,
            jwt_decoder,
            inventory,
            started_at: Instant::now(),
        }
    }

    /// Seconds since the state was built.
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
