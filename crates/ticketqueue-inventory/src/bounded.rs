//! Bounded-latency wrapper around an inventory source.

use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use ticketqueue_core::error::AppError;
use ticketqueue_core::result::AppResult;
use ticketqueue_core::traits::{InventorySource, PoolSnapshot};
use ticketqueue_core::types::PoolId;

/// Fails any read that takes longer than the configured limit.
///
/// Every hub awaits its inventory reads inline, so an unbounded read would
/// stall admission for the whole tier.
#[derive(Debug)]
pub struct BoundedInventory<S> {
    inner: S,
    limit: Duration,
}

impl<S: InventorySource> BoundedInventory<S> {
    /// Wraps `inner`, bounding each read by `limit`.
    pub fn new(inner: S, limit: Duration) -> Self {
        Self { inner, limit }
    }
}

#[async_trait]
impl<S: InventorySource> InventorySource for BoundedInventory<S> {
    async fn get_by_id(&self, pool: &PoolId) -> AppResult<PoolSnapshot> {
        match tokio::time::timeout(self.limit, self.inner.get_by_id(pool)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(pool = %pool, limit_ms = self.limit.as_millis() as u64, "Inventory read timed out");
                Err(AppError::timeout(format!(
                    "Inventory read for pool {pool} exceeded {}ms",
                    self.limit.as_millis()
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ticketqueue_core::error::ErrorKind;

    struct SlowInventory;

    #[async_trait]
    impl InventorySource for SlowInventory {
        async fn get_by_id(&self, pool: &PoolId) -> AppResult<PoolSnapshot> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(PoolSnapshot {
                id: *pool,
                name: "slow".to_string(),
                capacity: 1,
                registered: 0,
                price: 0,
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_slow_reads() {
        let bounded = BoundedInventory::new(SlowInventory, Duration::from_millis(200));
        let err = bounded.get_by_id(&PoolId::new()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Timeout);
    }

    #[tokio::test(start_paused = true)]
    async fn test_passes_fast_reads() {
        let bounded = BoundedInventory::new(SlowInventory, Duration::from_secs(10));
        assert!(bounded.get_by_id(&PoolId::new()).await.is_ok());
    }
}
