//! Short-lived read cache in front of an inventory source.

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use tracing::debug;

use ticketqueue_core::result::AppResult;
use ticketqueue_core::traits::{InventorySource, PoolSnapshot};
use ticketqueue_core::types::PoolId;

/// Caches successful pool reads for a fixed TTL.
///
/// Failed reads are never cached, so a recovering source is picked up on
/// the next call.
pub struct CachedInventory<S> {
    inner: S,
    cache: Cache<PoolId, PoolSnapshot>,
}

impl<S> std::fmt::Debug for CachedInventory<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedInventory")
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

impl<S: InventorySource> CachedInventory<S> {
    /// Wraps `inner` with a cache whose entries live for `ttl`.
    pub fn new(inner: S, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(1024)
            .time_to_live(ttl)
            .build();
        Self { inner, cache }
    }

    /// Drops every cached entry.
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }
}

#[async_trait]
impl<S: InventorySource> InventorySource for CachedInventory<S> {
    async fn get_by_id(&self, pool: &PoolId) -> AppResult<PoolSnapshot> {
        if let Some(hit) = self.cache.get(pool).await {
            return Ok(hit);
        }

        let fresh = self.inner.get_by_id(pool).await?;
        debug!(pool = %pool, remaining = fresh.remaining(), "Inventory cache filled");
        self.cache.insert(*pool, fresh.clone()).await;
        Ok(fresh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryInventory;

    #[tokio::test]
    async fn test_serves_cached_figures() {
        let memory = MemoryInventory::new();
        let id = PoolId::new();
        memory.insert(PoolSnapshot {
            id,
            name: "pool".to_string(),
            capacity: 3,
            registered: 0,
            price: 10,
        });

        let cached = CachedInventory::new(memory.clone(), Duration::from_secs(60));
        assert_eq!(cached.get_by_id(&id).await.unwrap().remaining(), 3);

        memory.sell_out(&id).unwrap();
        assert_eq!(cached.get_by_id(&id).await.unwrap().remaining(), 3);

        cached.invalidate_all();
        assert_eq!(cached.get_by_id(&id).await.unwrap().remaining(), 0);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let memory = MemoryInventory::new();
        let id = PoolId::new();
        let cached = CachedInventory::new(memory.clone(), Duration::from_secs(60));
        assert!(cached.get_by_id(&id).await.is_err());

        memory.insert(PoolSnapshot {
            id,
            name: "late".to_string(),
            capacity: 1,
            registered: 0,
            price: 10,
        });
        assert!(cached.get_by_id(&id).await.is_ok());
    }
}
