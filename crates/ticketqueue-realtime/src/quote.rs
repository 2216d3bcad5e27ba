//! Price quotes sent after a merch selection.

use std::sync::Arc;

use rand::Rng;

use ticketqueue_core::config::QuoteConfig;
use ticketqueue_core::error::AppError;
use ticketqueue_core::result::AppResult;
use ticketqueue_core::traits::PoolSnapshot;

/// Computes the `PAYMENT CODE` amount for the pool a session selected.
pub trait QuoteStrategy: Send + Sync + 'static {
    /// Quote for one unit of `pool`.
    fn quote(&self, pool: &PoolSnapshot) -> i64;
}

/// Quotes the pool's base price unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasePrice;

impl QuoteStrategy for BasePrice {
    fn quote(&self, pool: &PoolSnapshot) -> i64 {
        pool.price
    }
}

/// Adds a random offset in `0..spread` to the base price, so that manual
/// bank transfers can be matched back to a session.
#[derive(Debug, Clone, Copy)]
pub struct Jittered {
    spread: u32,
}

impl Jittered {
    /// Creates a strategy with the given exclusive offset bound.
    pub fn new(spread: u32) -> Self {
        Self { spread }
    }
}

impl QuoteStrategy for Jittered {
    fn quote(&self, pool: &PoolSnapshot) -> i64 {
        if self.spread == 0 {
            return pool.price;
        }
        pool.price + i64::from(rand::rng().random_range(0..self.spread))
    }
}

/// Builds the configured strategy.
pub fn from_config(config: &QuoteConfig) -> AppResult<Arc<dyn QuoteStrategy>> {
    match config.strategy.as_str() {
        "base" => Ok(Arc::new(BasePrice)),
        "jitter" => Ok(Arc::new(Jittered::new(config.jitter_spread))),
        other => Err(AppError::configuration(format!(
            "Unknown quote strategy: '{other}'. Supported: base, jitter"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ticketqueue_core::types::PoolId;

    fn pool(price: i64) -> PoolSnapshot {
        PoolSnapshot {
            id: PoolId::new(),
            name: "pool".to_string(),
            capacity: 10,
            registered: 0,
            price,
        }
    }

    #[test]
    fn test_base_price() {
        assert_eq!(BasePrice.quote(&pool(120_000)), 120_000);
    }

    #[test]
    fn test_jitter_stays_in_range() {
        let strategy = Jittered::new(999);
        for _ in 0..200 {
            let quote = strategy.quote(&pool(100_000));
            assert!((100_000..100_999).contains(&quote));
        }
        assert_eq!(Jittered::new(0).quote(&pool(5)), 5);
    }

    #[test]
    fn test_from_config() {
        let mut config = QuoteConfig::default();
        assert!(from_config(&config).is_ok());
        config.strategy = "auction".to_string();
        assert!(from_config(&config).is_err());
    }
}
