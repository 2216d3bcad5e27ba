//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod app;
pub mod auth;
pub mod inventory;
pub mod logging;
pub mod queue;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

pub use self::app::{CorsConfig, ServerConfig};
pub use self::auth::AuthConfig;
pub use self::inventory::{InventoryConfig, PoolSeed};
pub use self::logging::LoggingConfig;
pub use self::queue::{QueueConfig, QuoteConfig, TierConfig};

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Token validation settings.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Admission queue settings.
    #[serde(default)]
    pub queue: QueueConfig,
    /// Inventory source settings.
    #[serde(default)]
    pub inventory: InventoryConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `TICKETQUEUE`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("TICKETQUEUE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }

    /// Load configuration from a single explicit file.
    pub fn from_file(path: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize {path}: {e}")))
    }

    /// Checks cross-field constraints the schema cannot express.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.queue.tiers.is_empty() {
            return Err(AppError::configuration("At least one queue tier is required"));
        }

        let mut slugs = HashSet::new();
        let mut pools = HashSet::new();
        for tier in &self.queue.tiers {
            if tier.slug.is_empty() {
                return Err(AppError::configuration("Tier slug must not be empty"));
            }
            if !slugs.insert(tier.slug.as_str()) {
                return Err(AppError::configuration(format!(
                    "Duplicate tier slug '{}'",
                    tier.slug
                )));
            }
            if tier.max_transaction == 0 {
                return Err(AppError::configuration(format!(
                    "Tier '{}' must allow at least one concurrent transaction",
                    tier.slug
                )));
            }
            if tier.with_merch_pool == tier.no_merch_pool {
                return Err(AppError::configuration(format!(
                    "Tier '{}' uses the same pool for both variants",
                    tier.slug
                )));
            }
            for pool in [tier.with_merch_pool, tier.no_merch_pool] {
                if !pools.insert(pool) {
                    return Err(AppError::configuration(format!(
                        "Pool {pool} is governed by more than one tier"
                    )));
                }
            }
        }

        match self.queue.quote.strategy.as_str() {
            "base" | "jitter" => {}
            other => {
                return Err(AppError::configuration(format!(
                    "Unknown quote strategy '{other}'"
                )));
            }
        }

        match self.inventory.provider.as_str() {
            "memory" => {}
            "postgres" if !self.inventory.database_url.is_empty() => {}
            "postgres" => {
                return Err(AppError::configuration(
                    "inventory.database_url is required for the postgres provider",
                ));
            }
            other => {
                return Err(AppError::configuration(format!(
                    "Unknown inventory provider '{other}'"
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::id::PoolId;

    fn tier(slug: &str) -> TierConfig {
        TierConfig {
            slug: slug.to_string(),
            name: String::new(),
            with_merch_pool: PoolId::new(),
            no_merch_pool: PoolId::new(),
            max_transaction: 4,
        }
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.queue.auth_timeout_seconds, 10);
        assert_eq!(config.queue.transaction_timeout_seconds, 190);
        assert_eq!(config.inventory.provider, "memory");
        assert_eq!(config.server.port, 8888);
    }

    #[test]
    fn test_validate_requires_tiers() {
        let config = AppConfig::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_duplicate_slug() {
        let mut config = AppConfig::default();
        config.queue.tiers = vec![tier("normal"), tier("normal")];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_shared_pool() {
        let mut config = AppConfig::default();
        let mut second = tier("pre-sale");
        let first = tier("early-bird");
        second.no_merch_pool = first.with_merch_pool;
        config.queue.tiers = vec![first, second];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_tiers() {
        let mut config = AppConfig::default();
        config.queue.tiers = vec![tier("early-bird"), tier("normal")];
        assert!(config.validate().is_ok());
        assert!(config.queue.tier("normal").is_some());
        assert!(config.queue.tier("vip").is_none());
    }
}
