//! AMM Spot Price Resolution
//!
//! Converts a V3 pool's `sqrtPriceX96` into a spot exchange rate.
//!
//! The pool stores sqrt(token1/token0) as a Q64.96 fixed point number, so
//! price(token1 per token0) = (sqrtPriceX96 / 2^96)^2. Squaring a 160-bit
//! value needs 320 bits; the square is taken in a U512 and only the final
//! division by 2^192 happens in floating point.
//!
//! Created: 2026-10-19

use crate::error::{MonitorError, MonitorResult};
use crate::types::RawPoolState;
use alloy::primitives::{Address, U160, U512};

/// 2 * 96: the scale of sqrtPriceX96 squared
const Q192_BITS: i32 = 192;

/// Bits kept from the squared value when converting to f64.
/// f64 has a 53-bit mantissa; u128 leaves ample headroom.
const MANTISSA_BITS: usize = 128;

/// Price of token0 denominated in token1 (token1 per token0).
pub fn sqrt_price_x96_to_ratio(sqrt_price_x96: U160) -> f64 {
    let sqrt = U512::from(sqrt_price_x96);
    let squared = sqrt * sqrt;

    let bits = squared.bit_len();
    let (mantissa, shift) = if bits > MANTISSA_BITS {
        let shift = bits - MANTISSA_BITS;
        ((squared >> shift).to::<u128>(), shift as i32)
    } else {
        (squared.to::<u128>(), 0)
    };

    mantissa as f64 * 2f64.powi(shift - Q192_BITS)
}

/// Price of `target` denominated in `reference`.
///
/// `token0`/`token1` are the pool's actual ordering (sorted by address),
/// which may differ from how the pair is configured. Returns
/// `AddressMismatch` if the pool is not a `target`/`reference` pool; callers
/// must treat that as a hard error, never as a zero price.
pub fn resolve_spot_price(
    sqrt_price_x96: U160,
    token0: Address,
    token1: Address,
    reference: Address,
    target: Address,
) -> MonitorResult<f64> {
    let mismatch = || MonitorError::AddressMismatch {
        token0,
        token1,
        reference,
        target,
    };

    // Address equality is byte-wise, so hex casing never matters here
    let invert = if token1 == reference && token0 == target {
        false
    } else if token0 == reference && token1 == target {
        true
    } else {
        return Err(mismatch());
    };

    if sqrt_price_x96.is_zero() {
        return Err(MonitorError::UninitializedPool);
    }

    let ratio = sqrt_price_x96_to_ratio(sqrt_price_x96);
    Ok(if invert { 1.0 / ratio } else { ratio })
}

impl RawPoolState {
    /// Price of `target` denominated in `reference` for this pool state
    pub fn price_of(&self, target: Address, reference: Address) -> MonitorResult<f64> {
        resolve_spot_price(self.sqrt_price_x96, self.token0, self.token1, reference, target)
    }
}
