//! Contract Definitions
//!
//! PancakeSwap V3 interfaces used for pool discovery and price reads,
//! defined using alloy's `sol!` macro.
//!
//! PancakeSwap V3 is a Uniswap V3 fork, but `slot0()` differs: `feeProtocol`
//! is a `uint32` (two packed uint16 values) instead of `uint8`. Decoding a
//! PancakeSwap pool with the Uniswap ABI fails, so the pool gets its own
//! interface here.
//!
//! Created: 2026-10-19

use alloy::sol;

// ── PancakeSwap V3 ───────────────────────────────────────────────────

sol! {
    #[sol(rpc)]
    interface PancakeV3Factory {
        function getPool(address tokenA, address tokenB, uint24 fee) external view returns (address pool);
    }
}

sol! {
    #[sol(rpc)]
    interface PancakeV3Pool {
        function slot0() external view returns (uint160 sqrtPriceX96, int24 tick, uint16 observationIndex, uint16 observationCardinality, uint16 observationCardinalityNext, uint32 feeProtocol, bool unlocked);
        function token0() external view returns (address);
        function token1() external view returns (address);
    }
}
