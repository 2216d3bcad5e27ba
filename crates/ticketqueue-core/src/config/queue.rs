//! Admission queue configuration.

use serde::{Deserialize, Serialize};

use crate::types::id::PoolId;

/// Admission queue settings shared by every tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Seconds a fresh connection has to present a valid token.
    #[serde(default = "default_auth_timeout")]
    pub auth_timeout_seconds: u64,
    /// Seconds an admitted session has to finish its purchase.
    #[serde(default = "default_transaction_timeout")]
    pub transaction_timeout_seconds: u64,
    /// Price quote settings.
    #[serde(default)]
    pub quote: QuoteConfig,
    /// One entry per governed pool pair.
    #[serde(default)]
    pub tiers: Vec<TierConfig>,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            auth_timeout_seconds: default_auth_timeout(),
            transaction_timeout_seconds: default_transaction_timeout(),
            quote: QuoteConfig::default(),
            tiers: Vec::new(),
        }
    }
}

impl QueueConfig {
    /// Finds a tier by its URL slug.
    pub fn tier(&self, slug: &str) -> Option<&TierConfig> {
        self.tiers.iter().find(|t| t.slug == slug)
    }
}

/// A ticket tier: the merch / no-merch pool pair governed by one hub.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierConfig {
    /// URL slug, e.g. `early-bird`.
    pub slug: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Pool sold with merchandise.
    pub with_merch_pool: PoolId,
    /// Pool sold without merchandise.
    pub no_merch_pool: PoolId,
    /// Configured ceiling on concurrent transaction slots.
    #[serde(default = "default_max_transaction")]
    pub max_transaction: usize,
}

/// How the `PAYMENT CODE` quote is computed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteConfig {
    /// Strategy: `"base"` or `"jitter"`.
    #[serde(default = "default_strategy")]
    pub strategy: String,
    /// Exclusive upper bound of the random offset added by `jitter`.
    #[serde(default = "default_jitter_spread")]
    pub jitter_spread: u32,
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            jitter_spread: default_jitter_spread(),
        }
    }
}

fn default_auth_timeout() -> u64 {
    10
}

fn default_transaction_timeout() -> u64 {
    190
}

fn default_max_transaction() -> usize {
    4
}

fn default_strategy() -> String {
    "jitter".to_string()
}

fn default_jitter_spread() -> u32 {
    999
}
