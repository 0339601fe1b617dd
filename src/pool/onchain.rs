//! On-chain pool collaborators (alloy)
//!
//! `FactoryPoolLookup` asks the PancakeSwap V3 factory for the pool of a
//! pair at one fee tier. `OnChainPoolReader` reads `slot0()` together with
//! the pool's actual token ordering.
//!
//! V3 pools sort tokens by address (token0 < token1). The ordering is read
//! from the pool contract every cycle, never assumed from configuration.

use super::{PoolLookup, PoolStateReader};
use crate::contracts::{PancakeV3Factory, PancakeV3Pool};
use crate::error::{MonitorError, MonitorResult};
use crate::types::{PoolReference, RawPoolState};
use alloy::primitives::aliases::I24;
use alloy::primitives::Address;
use alloy::providers::Provider;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Convert u32 fee tier to alloy uint24 type for contract calls.
/// Uses from_limbs() because Uint<24, 1> doesn't impl From<u32>.
fn fee_to_u24(fee: u32) -> alloy::primitives::Uint<24, 1> {
    debug_assert!(fee <= 0xFFFFFF, "fee {} exceeds U24 max (16777215)", fee);
    alloy::primitives::Uint::from_limbs([fee as u64])
}

/// int24 tick from slot0 as i32. Failure is a decode error, never tick 0.
fn tick_to_i32(tick: I24) -> MonitorResult<i32> {
    i32::try_from(tick).map_err(|e| MonitorError::fetch("pool.slot0", format!("tick {}: {}", tick, e)))
}

/// Factory `getPool` lookup
pub struct FactoryPoolLookup<P> {
    provider: Arc<P>,
    factory: Address,
}

impl<P: Provider + 'static> FactoryPoolLookup<P> {
    pub fn new(provider: Arc<P>, factory: Address) -> Self {
        Self { provider, factory }
    }
}

#[async_trait]
impl<P: Provider + 'static> PoolLookup for FactoryPoolLookup<P> {
    async fn pool_address(
        &self,
        token_a: Address,
        token_b: Address,
        fee_tier: u32,
    ) -> MonitorResult<Address> {
        let factory = PancakeV3Factory::new(self.factory, self.provider.clone());
        let pool = factory
            .getPool(token_a, token_b, fee_to_u24(fee_tier))
            .call()
            .await
            .map_err(|e| MonitorError::fetch("factory.getPool", e))?;
        debug!("getPool @ {} -> {:?}", fee_tier, pool);
        Ok(pool)
    }
}

/// Reads sqrtPriceX96, tick and token ordering from a pool
pub struct OnChainPoolReader<P> {
    provider: Arc<P>,
}

impl<P: Provider + 'static> OnChainPoolReader<P> {
    pub fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<P: Provider + 'static> PoolStateReader for OnChainPoolReader<P> {
    async fn read_pool_state(&self, pool: &PoolReference) -> MonitorResult<RawPoolState> {
        let contract = PancakeV3Pool::new(pool.address, self.provider.clone());
        let slot0_call = contract.slot0();
        let token0_call = contract.token0();
        let token1_call = contract.token1();
        let (slot0, token0, token1) = tokio::join!(
            slot0_call.call(),
            token0_call.call(),
            token1_call.call()
        );

        let slot0 = slot0.map_err(|e| MonitorError::fetch("pool.slot0", e))?;
        let token0 = token0.map_err(|e| MonitorError::fetch("pool.token0", e))?;
        let token1 = token1.map_err(|e| MonitorError::fetch("pool.token1", e))?;

        Ok(RawPoolState {
            sqrt_price_x96: slot0.sqrtPriceX96,
            tick: tick_to_i32(slot0.tick)?,
            token0,
            token1,
        })
    }
}
