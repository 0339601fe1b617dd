//! Pool module
//!
//! Spot price resolution from V3 pool state, fee-tier pool discovery with
//! a process-lifetime cache, and the alloy-backed collaborators that talk
//! to the factory and pool contracts.
//!
//! Created: 2026-10-19

pub mod locator;
pub mod onchain;
pub mod price;

pub use locator::{PoolLocator, PANCAKE_V3_FEE_TIERS};
pub use onchain::{FactoryPoolLookup, OnChainPoolReader};
pub use price::{resolve_spot_price, sqrt_price_x96_to_ratio};

use crate::error::MonitorResult;
use crate::types::{PoolReference, RawPoolState};
use alloy::primitives::Address;
use async_trait::async_trait;

/// Factory lookup: pool address for a pair at one fee tier.
/// `Address::ZERO` means no pool exists at that tier.
#[async_trait]
pub trait PoolLookup: Send + Sync {
    async fn pool_address(
        &self,
        token_a: Address,
        token_b: Address,
        fee_tier: u32,
    ) -> MonitorResult<Address>;
}

/// Reads the current raw state of a located pool
#[async_trait]
pub trait PoolStateReader: Send + Sync {
    async fn read_pool_state(&self, pool: &PoolReference) -> MonitorResult<RawPoolState>;
}
