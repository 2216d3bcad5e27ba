//! In-memory inventory backed by a concurrent map.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::info;

use ticketqueue_core::config::PoolSeed;
use ticketqueue_core::error::AppError;
use ticketqueue_core::result::AppResult;
use ticketqueue_core::traits::{InventorySource, PoolSnapshot};
use ticketqueue_core::types::PoolId;

/// Pools held in process memory.
///
/// Suitable for single-node deployments and tests. The mutators stand in
/// for the purchase flow that records sales outside the queue.
#[derive(Debug, Clone, Default)]
pub struct MemoryInventory {
    pools: Arc<DashMap<PoolId, PoolSnapshot>>,
}

impl MemoryInventory {
    /// Creates an empty inventory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an inventory seeded from configuration.
    pub fn from_seeds(seeds: &[PoolSeed]) -> Self {
        let inventory = Self::new();
        for seed in seeds {
            inventory.insert(PoolSnapshot {
                id: seed.id,
                name: seed.name.clone(),
                capacity: seed.capacity,
                registered: seed.registered,
                price: seed.price,
            });
        }
        info!(pools = seeds.len(), "Memory inventory seeded");
        inventory
    }

    /// Inserts or replaces a pool.
    pub fn insert(&self, snapshot: PoolSnapshot) {
        self.pools.insert(snapshot.id, snapshot);
    }

    /// Records one sale against a pool, refusing it when the pool is full.
    ///
    /// The capacity check and the increment happen under the pool's entry
    /// lock, so concurrent callers can never push `registered` past
    /// `capacity`.
    pub fn try_record_registration(&self, pool: &PoolId) -> AppResult<PoolSnapshot> {
        let mut entry = self
            .pools
            .get_mut(pool)
            .ok_or_else(|| AppError::not_found(format!("Pool {pool} not found")))?;
        if entry.is_exhausted() {
            return Err(AppError::conflict("Event is full"));
        }
        entry.registered += 1;
        Ok(entry.value().clone())
    }

    /// Reverts a sale recorded by [`Self::try_record_registration`].
    pub fn release_registration(&self, pool: &PoolId) -> AppResult<()> {
        let mut entry = self
            .pools
            .get_mut(pool)
            .ok_or_else(|| AppError::not_found(format!("Pool {pool} not found")))?;
        entry.registered = (entry.registered - 1).max(0);
        Ok(())
    }

    /// Marks a pool as sold out.
    pub fn sell_out(&self, pool: &PoolId) -> AppResult<()> {
        let mut entry = self
            .pools
            .get_mut(pool)
            .ok_or_else(|| AppError::not_found(format!("Pool {pool} not found")))?;
        entry.registered = entry.capacity;
        Ok(())
    }
}

#[async_trait]
impl InventorySource for MemoryInventory {
    async fn get_by_id(&self, pool: &PoolId) -> AppResult<PoolSnapshot> {
        self.pools
            .get(pool)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AppError::not_found(format!("Pool {pool} not found")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ticketqueue_core::error::ErrorKind;

    fn seed(capacity: i64) -> PoolSeed {
        PoolSeed {
            id: PoolId::new(),
            name: "Normal with merchandise bundle".to_string(),
            capacity,
            registered: 0,
            price: 150_000,
        }
    }

    #[tokio::test]
    async fn test_get_seeded_pool() {
        let seed = seed(20);
        let inventory = MemoryInventory::from_seeds(std::slice::from_ref(&seed));
        let pool = inventory.get_by_id(&seed.id).await.unwrap();
        assert_eq!(pool.capacity, 20);
        assert_eq!(pool.remaining(), 20);
    }

    #[tokio::test]
    async fn test_record_registration_stops_at_capacity() {
        let seed = seed(2);
        let inventory = MemoryInventory::from_seeds(std::slice::from_ref(&seed));
        assert_eq!(inventory.try_record_registration(&seed.id).unwrap().remaining(), 1);
        assert_eq!(inventory.try_record_registration(&seed.id).unwrap().remaining(), 0);

        let err = inventory.try_record_registration(&seed.id).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
        assert_eq!(inventory.get_by_id(&seed.id).await.unwrap().registered, 2);

        inventory.release_registration(&seed.id).unwrap();
        assert_eq!(inventory.get_by_id(&seed.id).await.unwrap().remaining(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_sales_never_oversell() {
        let seed = seed(3);
        let inventory = MemoryInventory::from_seeds(std::slice::from_ref(&seed));

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let inventory = inventory.clone();
                let id = seed.id;
                tokio::spawn(async move { inventory.try_record_registration(&id).is_ok() })
            })
            .collect();

        let mut sold = 0;
        for task in tasks {
            if task.await.unwrap() {
                sold += 1;
            }
        }
        assert_eq!(sold, 3);
        let pool = inventory.get_by_id(&seed.id).await.unwrap();
        assert_eq!(pool.registered, pool.capacity);
    }

    #[tokio::test]
    async fn test_sell_out() {
        let seed = seed(5);
        let inventory = MemoryInventory::from_seeds(std::slice::from_ref(&seed));
        inventory.sell_out(&seed.id).unwrap();
        assert!(inventory.get_by_id(&seed.id).await.unwrap().is_exhausted());
    }

    #[tokio::test]
    async fn test_unknown_pool() {
        let inventory = MemoryInventory::new();
        assert!(inventory.get_by_id(&PoolId::new()).await.is_err());
        assert!(inventory.try_record_registration(&PoolId::new()).is_err());
        assert!(inventory.release_registration(&PoolId::new()).is_err());
    }
}
