//! Response DTOs.

use serde::{Deserialize, Serialize};

use ticketqueue_realtime::HubSnapshot;
use ticketqueue_realtime::metrics::MetricsSnapshot;

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Crate version.
    pub version: String,
    /// Seconds since startup.
    pub uptime_seconds: u64,
    /// Number of configured tiers.
    pub tiers: usize,
    /// Engine counters.
    pub metrics: MetricsSnapshot,
}

/// Queue status for one tier.
#[derive(Debug, Clone, Serialize)]
pub struct QueueStatusResponse {
    /// Hub state.
    #[serde(flatten)]
    pub hub: HubSnapshot,
    /// Engine counters.
    pub metrics: MetricsSnapshot,
}

/// Simple message response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Message text.
    pub message: String,
}

impl MessageResponse {
    /// Creates a new message response.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
