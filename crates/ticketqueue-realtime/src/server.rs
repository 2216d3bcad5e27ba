//! Top-level queue engine that owns one admission hub per ticket tier.

use std::sync::Arc;

use tracing::info;

use ticketqueue_core::config::QueueConfig;
use ticketqueue_core::error::AppError;
use ticketqueue_core::result::AppResult;
use ticketqueue_core::traits::{InventorySource, TokenAuthenticator};
use ticketqueue_core::types::PoolId;

use crate::connection::handler::ConnectionHandler;
use crate::hub::{AdmissionHub, HubHandle};
use crate::metrics::{MetricsSnapshot, QueueMetrics};
use crate::quote::{self, QuoteStrategy};

/// Central queue engine coordinating every tier.
#[derive(Clone)]
pub struct QueueEngine {
    hubs: Arc<Vec<HubHandle>>,
    authenticator: Arc<dyn TokenAuthenticator>,
    metrics: Arc<QueueMetrics>,
    config: Arc<QueueConfig>,
}

impl std::fmt::Debug for QueueEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueEngine")
            .field("tiers", &self.hubs.iter().map(HubHandle::tier).collect::<Vec<_>>())
            .finish()
    }
}

impl QueueEngine {
    /// Spawns one hub per configured tier. Must be called inside a Tokio runtime.
    pub fn new(
        config: &QueueConfig,
        inventory: Arc<dyn InventorySource>,
        authenticator: Arc<dyn TokenAuthenticator>,
    ) -> AppResult<Self> {
        let quote = quote::from_config(&config.quote)?;
        Ok(Self::with_quote(config, inventory, authenticator, quote))
    }

    /// Like [`QueueEngine::new`] with an explicit quote strategy.
    pub fn with_quote(
        config: &QueueConfig,
        inventory: Arc<dyn InventorySource>,
        authenticator: Arc<dyn TokenAuthenticator>,
        quote: Arc<dyn QuoteStrategy>,
    ) -> Self {
        let metrics = Arc::new(QueueMetrics::new());

        let hubs = config
            .tiers
            .iter()
            .map(|tier| {
                AdmissionHub::spawn(
                    tier.clone(),
                    Arc::clone(&inventory),
                    Arc::clone(&quote),
                    Arc::clone(&metrics),
                )
            })
            .collect::<Vec<_>>();

        info!(tiers = hubs.len(), "Queue engine initialized");

        Self {
            hubs: Arc::new(hubs),
            authenticator,
            metrics,
            config: Arc::new(config.clone()),
        }
    }

    /// Hub for a tier slug.
    pub fn hub(&self, tier: &str) -> Option<&HubHandle> {
        self.hubs.iter().find(|h| h.tier() == tier)
    }

    /// Hub for a tier slug, or a `NotFound` error.
    pub fn require_hub(&self, tier: &str) -> AppResult<&HubHandle> {
        self.hub(tier)
            .ok_or_else(|| AppError::not_found(format!("Unknown ticket tier '{tier}'")))
    }

    /// Hub governing `pool`, if any.
    pub fn hub_for_pool(&self, pool: &PoolId) -> Option<&HubHandle> {
        self.hubs.iter().find(|h| h.governs(pool))
    }

    /// Every hub, in configuration order.
    pub fn hubs(&self) -> impl Iterator<Item = &HubHandle> {
        self.hubs.iter()
    }

    /// Connection handler for a tier.
    pub fn handler(&self, tier: &str) -> AppResult<ConnectionHandler> {
        let hub = self.require_hub(tier)?.clone();
        Ok(ConnectionHandler::new(
            hub,
            Arc::clone(&self.authenticator),
            Arc::clone(&self.metrics),
            &self.config,
        ))
    }

    /// Engine-wide counters.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ticketqueue_core::config::TierConfig;
    use ticketqueue_inventory::MemoryInventory;

    struct Rejecting;

    #[async_trait]
    impl TokenAuthenticator for Rejecting {
        async fn authenticate(&self, _token: &str) -> AppResult<String> {
            Err(AppError::unauthorized("no"))
        }
    }

    fn tier(slug: &str) -> TierConfig {
        TierConfig {
            slug: slug.to_string(),
            name: slug.to_uppercase(),
            with_merch_pool: PoolId::new(),
            no_merch_pool: PoolId::new(),
            max_transaction: 4,
        }
    }

    #[tokio::test]
    async fn test_routes_by_tier_and_pool() {
        let config = QueueConfig {
            tiers: vec![tier("early-bird"), tier("normal")],
            ..QueueConfig::default()
        };
        let normal_pool = config.tiers[1].no_merch_pool;
        let engine = QueueEngine::new(
            &config,
            Arc::new(MemoryInventory::new()),
            Arc::new(Rejecting),
        )
        .unwrap();

        assert_eq!(engine.hub("early-bird").map(HubHandle::tier), Some("early-bird"));
        assert!(engine.hub("vip").is_none());
        assert!(engine.handler("vip").is_err());
        assert_eq!(
            engine.hub_for_pool(&normal_pool).map(HubHandle::tier),
            Some("normal")
        );
        assert!(engine.hub_for_pool(&PoolId::new()).is_none());

        assert_eq!(engine.hubs().count(), 2);
        let first = engine.hubs().next().unwrap().snapshot().await.unwrap();
        assert_eq!(first.name, "EARLY-BIRD");
    }
}
