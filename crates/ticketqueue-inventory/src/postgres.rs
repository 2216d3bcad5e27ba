//! PostgreSQL inventory source.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;
use uuid::Uuid;

use ticketqueue_core::config::InventoryConfig;
use ticketqueue_core::error::{AppError, ErrorKind};
use ticketqueue_core::result::AppResult;
use ticketqueue_core::traits::{InventorySource, PoolSnapshot};
use ticketqueue_core::types::PoolId;

type EventRow = (Uuid, String, i64, i64, i64);

/// Reads pool figures from the `events` table.
#[derive(Debug, Clone)]
pub struct PgInventory {
    pool: PgPool,
}

impl PgInventory {
    /// Connects using the inventory configuration.
    pub async fn connect(config: &InventoryConfig) -> AppResult<Self> {
        info!(
            max_connections = config.max_connections,
            "Connecting inventory source to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(&config.database_url)
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Database,
                    format!("Failed to connect to inventory database: {e}"),
                    e,
                )
            })?;

        Ok(Self { pool })
    }
}

fn into_snapshot((id, name, capacity, registered, price): EventRow) -> PoolSnapshot {
    PoolSnapshot {
        id: PoolId::from_uuid(id),
        name,
        capacity,
        registered,
        price,
    }
}

#[async_trait]
impl InventorySource for PgInventory {
    async fn get_by_id(&self, pool: &PoolId) -> AppResult<PoolSnapshot> {
        let row = sqlx::query_as::<_, EventRow>(
            "SELECT id, name, capacity::BIGINT, registers::BIGINT, price::BIGINT \
             FROM events WHERE id = $1",
        )
        .bind(pool.into_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to read event pool", e))?;

        row.map(into_snapshot)
            .ok_or_else(|| AppError::not_found(format!("Pool {pool} not found")))
    }
}
