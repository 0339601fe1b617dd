//! Pool Locator
//!
//! Resolves the V3 pool for a token pair by probing the factory across a
//! fixed, ordered list of fee tiers. The first tier that returns a non-zero
//! address wins and is cached for the process lifetime.
//!
//! Order matters: it decides which pool is preferred when the pair is listed
//! in more than one tier.
//!
//! A failed lookup for one tier is logged and the next tier is tried. There
//! is no retry: a tier that errors this time is queried again only if the
//! whole discovery fails and the next poll cycle calls `locate` again.
//!
//! Created: 2026-10-19

use super::PoolLookup;
use crate::error::{MonitorError, MonitorResult};
use crate::types::PoolReference;
use alloy::primitives::Address;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// PancakeSwap V3 fee tiers in query order
pub const PANCAKE_V3_FEE_TIERS: [u32; 4] = [
    2500,  // 0.25% - default tier for volatile pairs
    500,   // 0.05%
    10000, // 1.00%
    100,   // 0.01% - stable pairs
];

/// Memoizing pool locator
pub struct PoolLocator {
    lookup: Arc<dyn PoolLookup>,
    fee_tiers: Vec<u32>,
    /// Keyed by the address-sorted pair, so (A, B) and (B, A) share an entry
    cache: DashMap<(Address, Address), PoolReference>,
}

impl PoolLocator {
    pub fn new(lookup: Arc<dyn PoolLookup>) -> Self {
        Self::with_fee_tiers(lookup, PANCAKE_V3_FEE_TIERS.to_vec())
    }

    pub fn with_fee_tiers(lookup: Arc<dyn PoolLookup>, fee_tiers: Vec<u32>) -> Self {
        Self {
            lookup,
            fee_tiers,
            cache: DashMap::new(),
        }
    }

    fn key(token_a: Address, token_b: Address) -> (Address, Address) {
        if token_a <= token_b {
            (token_a, token_b)
        } else {
            (token_b, token_a)
        }
    }

    /// Cached pool for the pair, if discovery already succeeded
    pub fn cached(&self, token_a: Address, token_b: Address) -> Option<PoolReference> {
        self.cache
            .get(&Self::key(token_a, token_b))
            .map(|entry| *entry.value())
    }

    /// Locate the pool for `token_a`/`token_b`, probing fee tiers on first use
    pub async fn locate(&self, token_a: Address, token_b: Address) -> MonitorResult<PoolReference> {
        if let Some(pool) = self.cached(token_a, token_b) {
            return Ok(pool);
        }

        for &fee_tier in &self.fee_tiers {
            match self.lookup.pool_address(token_a, token_b, fee_tier).await {
                Ok(address) if address == Address::ZERO => {
                    debug!("No pool @ {}% fee", fee_tier as f64 / 10000.0);
                }
                Ok(address) => {
                    let pool = PoolReference { address, fee_tier };
                    info!("Pool located: {}", pool);
                    // entry() keeps the first pool if two callers raced here
                    let pool = *self
                        .cache
                        .entry(Self::key(token_a, token_b))
                        .or_insert(pool)
                        .value();
                    return Ok(pool);
                }
                Err(e) => {
                    warn!("Pool lookup failed @ {}% fee, trying next tier: {}", fee_tier as f64 / 10000.0, e);
                }
            }
        }

        Err(MonitorError::PoolNotFound { token_a, token_b })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    const TAKE: Address = address!("E747E54783Ba3F77a8E5251a3cBA19EBe9C0E197");
    const WBNB: Address = address!("bb4CdB9CBd36B01bD1cBaEBF2De08d9173bc095c");
    const POOL: Address = address!("1111111111111111111111111111111111111111");

    /// Factory fake: per-tier answers, records every tier queried
    struct FakeFactory {
        answers: HashMap<u32, MonitorResult<Address>>,
        queried: Mutex<Vec<u32>>,
    }

    impl FakeFactory {
        fn new(answers: Vec<(u32, MonitorResult<Address>)>) -> Arc<Self> {
            Arc::new(Self {
                answers: answers.into_iter().collect(),
                queried: Mutex::new(Vec::new()),
            })
        }

        fn queried(&self) -> Vec<u32> {
            self.queried.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PoolLookup for FakeFactory {
        async fn pool_address(&self, _a: Address, _b: Address, fee_tier: u32) -> MonitorResult<Address> {
            self.queried.lock().unwrap().push(fee_tier);
            match self.answers.get(&fee_tier) {
                Some(Ok(addr)) => Ok(*addr),
                Some(Err(_)) => Err(MonitorError::fetch("factory", "rpc timeout")),
                None => Ok(Address::ZERO),
            }
        }
    }

    #[tokio::test]
    async fn test_first_nonzero_tier_wins_and_later_tiers_skipped() {
        let factory = FakeFactory::new(vec![
            (2500, Ok(Address::ZERO)),
            (500, Ok(Address::ZERO)),
            (10000, Ok(POOL)),
            (100, Ok(address!("2222222222222222222222222222222222222222"))),
        ]);
        let locator = PoolLocator::new(factory.clone());

        let pool = locator.locate(TAKE, WBNB).await.unwrap();
        assert_eq!(pool, PoolReference { address: POOL, fee_tier: 10000 });
        assert_eq!(factory.queried(), vec![2500, 500, 10000]);
    }

    #[tokio::test]
    async fn test_result_is_cached() {
        let factory = FakeFactory::new(vec![(2500, Ok(POOL))]);
        let locator = PoolLocator::new(factory.clone());

        locator.locate(TAKE, WBNB).await.unwrap();
        // Reversed order hits the same cache entry
        let again = locator.locate(WBNB, TAKE).await.unwrap();

        assert_eq!(again.address, POOL);
        assert_eq!(factory.queried(), vec![2500]);
    }

    #[tokio::test]
    async fn test_failed_tier_falls_through_to_next() {
        let factory = FakeFactory::new(vec![
            (2500, Err(MonitorError::fetch("factory", "boom"))),
            (500, Ok(POOL)),
        ]);
        let locator = PoolLocator::new(factory.clone());

        let pool = locator.locate(TAKE, WBNB).await.unwrap();
        assert_eq!(pool.fee_tier, 500);
        // Failed tier was not retried
        assert_eq!(factory.queried(), vec![2500, 500]);
    }

    #[tokio::test]
    async fn test_no_tier_is_pool_not_found() {
        let factory = FakeFactory::new(vec![]);
        let locator = PoolLocator::new(factory.clone());

        let err = locator.locate(TAKE, WBNB).await.unwrap_err();
        assert!(matches!(err, MonitorError::PoolNotFound { .. }));
        assert_eq!(factory.queried(), PANCAKE_V3_FEE_TIERS.to_vec());
        assert!(locator.cached(TAKE, WBNB).is_none());

        // Nothing cached, so the next call queried again
        let _ = locator.locate(TAKE, WBNB).await;
        assert_eq!(factory.queried().len(), 8);
    }

    #[test]
    fn test_fee_tier_order() {
        assert_eq!(PANCAKE_V3_FEE_TIERS, [2500, 500, 10000, 100]);
    }
}
