//! Inventory source trait and pool figures.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::result::AppResult;
use crate::types::id::PoolId;

/// Point-in-time figures of one inventory pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    /// Pool identifier.
    pub id: PoolId,
    /// Display name.
    pub name: String,
    /// Total capacity of the pool.
    pub capacity: i64,
    /// Units already registered (sold) outside the queue.
    pub registered: i64,
    /// Base price of one unit.
    pub price: i64,
}

impl PoolSnapshot {
    /// Units still available, never negative.
    pub fn remaining(&self) -> i64 {
        (self.capacity - self.registered).max(0)
    }

    /// True when no unit is left.
    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }
}

/// Reports live capacity figures for named pools.
///
/// Reads sit on the admission hub's hot path, so implementations must be
/// fast or wrapped in a cache / bounded-latency adapter.
#[async_trait]
pub trait InventorySource: Send + Sync + 'static {
    /// Fetch the current figures of one pool.
    async fn get_by_id(&self, pool: &PoolId) -> AppResult<PoolSnapshot>;
}

#[async_trait]
impl<T: InventorySource + ?Sized> InventorySource for Arc<T> {
    async fn get_by_id(&self, pool: &PoolId) -> AppResult<PoolSnapshot> {
        (**self).get_by_id(pool).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remaining_is_clamped() {
        let snapshot = PoolSnapshot {
            id: PoolId::new(),
            name: "oversold".to_string(),
            capacity: 5,
            registered: 7,
            price: 0,
        };
        assert_eq!(snapshot.remaining(), 0);
        assert!(snapshot.is_exhausted());
    }
}
