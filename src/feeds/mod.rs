//! Reference price feeds
//!
//! Off-chain prices the monitor compares against: the target's index price
//! (divergence reference) and the quote asset's USD price (conversion of the
//! pool rate into USD).
//!
//! Created: 2026-10-19

pub mod binance;

pub use binance::BinanceClient;

use crate::error::MonitorResult;
use async_trait::async_trait;

/// Source of USD reference prices.
///
/// `Ok(None)` means the source answered but had no usable price; `Err` means
/// the request itself failed. The monitor treats both as "absent" for the
/// index price and skips the cycle for the quote price.
#[async_trait]
pub trait ReferencePriceSource: Send + Sync {
    /// Index (mark reference) price of the target asset in USD
    async fn index_price_usd(&self) -> MonitorResult<Option<f64>>;

    /// USD price of the pool's quote asset
    async fn quote_price_usd(&self) -> MonitorResult<Option<f64>>;
}
