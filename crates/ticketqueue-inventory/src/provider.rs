//! Inventory manager that assembles the configured source stack.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use ticketqueue_core::config::InventoryConfig;
use ticketqueue_core::error::AppError;
use ticketqueue_core::result::AppResult;
use ticketqueue_core::traits::{InventorySource, PoolSnapshot};
use ticketqueue_core::types::PoolId;

use crate::bounded::BoundedInventory;
use crate::cached::CachedInventory;
use crate::memory::MemoryInventory;

/// Inventory source selected and wrapped according to configuration.
///
/// The stack is `provider -> cache (optional) -> latency bound`.
#[derive(Clone)]
pub struct InventoryManager {
    inner: Arc<dyn InventorySource>,
    memory: Option<MemoryInventory>,
}

impl std::fmt::Debug for InventoryManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InventoryManager")
            .field("memory", &self.memory.is_some())
            .finish()
    }
}

impl InventoryManager {
    /// Builds the inventory stack from configuration.
    pub async fn new(config: &InventoryConfig) -> AppResult<Self> {
        let (base, memory): (Arc<dyn InventorySource>, Option<MemoryInventory>) =
            match config.provider.as_str() {
                "memory" => {
                    info!(pools = config.pools.len(), "Initializing in-memory inventory");
                    let memory = MemoryInventory::from_seeds(&config.pools);
                    (Arc::new(memory.clone()), Some(memory))
                }
                #[cfg(feature = "postgres")]
                "postgres" => {
                    info!("Initializing PostgreSQL inventory");
                    let pg = crate::postgres::PgInventory::connect(config).await?;
                    (Arc::new(pg), None)
                }
                other => {
                    return Err(AppError::configuration(format!(
                        "Unknown inventory provider: '{other}'. Supported: memory, postgres"
                    )));
                }
            };

        Ok(Self {
            inner: wrap(base, config),
            memory,
        })
    }

    /// The in-memory backing store, when the memory provider is active.
    pub fn memory(&self) -> Option<&MemoryInventory> {
        self.memory.as_ref()
    }

    /// The assembled source.
    pub fn source(&self) -> Arc<dyn InventorySource> {
        Arc::clone(&self.inner)
    }
}

fn wrap(base: Arc<dyn InventorySource>, config: &InventoryConfig) -> Arc<dyn InventorySource> {
    let limit = Duration::from_millis(config.read_timeout_ms.max(1));
    if config.cache_ttl_ms > 0 {
        let cached = CachedInventory::new(base, Duration::from_millis(config.cache_ttl_ms));
        Arc::new(BoundedInventory::new(cached, limit))
    } else {
        Arc::new(BoundedInventory::new(base, limit))
    }
}

#[async_trait]
impl InventorySource for InventoryManager {
    async fn get_by_id(&self, pool: &PoolId) -> AppResult<PoolSnapshot> {
        self.inner.get_by_id(pool).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ticketqueue_core::config::PoolSeed;

    #[tokio::test]
    async fn test_memory_provider_from_config() {
        let id = PoolId::new();
        let config = InventoryConfig {
            pools: vec![PoolSeed {
                id,
                name: "Early bird".to_string(),
                capacity: 7,
                registered: 2,
                price: 100,
            }],
            ..InventoryConfig::default()
        };

        let manager = InventoryManager::new(&config).await.unwrap();
        assert_eq!(manager.get_by_id(&id).await.unwrap().remaining(), 5);

        manager.memory().unwrap().sell_out(&id).unwrap();
        assert!(manager.get_by_id(&id).await.unwrap().is_exhausted());
    }

    #[tokio::test]
    async fn test_unknown_provider() {
        let config = InventoryConfig {
            provider: "redis".to_string(),
            ..InventoryConfig::default()
        };
        assert!(InventoryManager::new(&config).await.is_err());
    }
}
