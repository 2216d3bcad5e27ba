//! Inventory source configuration.

use serde::{Deserialize, Serialize};

use crate::types::id::PoolId;

/// Where pool capacity figures are read from, and how reads are guarded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryConfig {
    /// Provider: `"memory"` or `"postgres"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// PostgreSQL connection URL (postgres provider only).
    #[serde(default)]
    pub database_url: String,
    /// Maximum connections for the postgres provider.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// How long a pool read stays cached, in milliseconds. `0` disables caching.
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_ms: u64,
    /// Upper bound on a single pool read, in milliseconds.
    #[serde(default = "default_read_timeout")]
    pub read_timeout_ms: u64,
    /// Seed pools for the memory provider.
    #[serde(default)]
    pub pools: Vec<PoolSeed>,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            database_url: String::new(),
            max_connections: default_max_connections(),
            cache_ttl_ms: default_cache_ttl(),
            read_timeout_ms: default_read_timeout(),
            pools: Vec::new(),
        }
    }
}

/// Initial figures for one pool of the memory provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolSeed {
    /// Pool identifier.
    pub id: PoolId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Total capacity.
    pub capacity: i64,
    /// Already registered (sold) units.
    #[serde(default)]
    pub registered: i64,
    /// Base price.
    #[serde(default)]
    pub price: i64,
}

fn default_provider() -> String {
    "memory".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_cache_ttl() -> u64 {
    0
}

fn default_read_timeout() -> u64 {
    500
}
