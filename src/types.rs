// Core data structures shared by the pool, alert and monitor modules

use alloy::primitives::{Address, U160};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A discovered liquidity pool. Immutable once located.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PoolReference {
    pub address: Address,
    /// Fee tier in hundredths of a bip (2500 = 0.25%)
    pub fee_tier: u32,
}

impl PoolReference {
    /// Fee tier as a percentage (2500 -> 0.25)
    pub fn fee_percent(&self) -> f64 {
        self.fee_tier as f64 / 10000.0
    }
}

impl fmt::Display for PoolReference {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?} @ {}%", self.address, self.fee_percent())
    }
}

/// Pool state as read from `slot0()` plus the token ordering.
/// Produced fresh every poll cycle, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPoolState {
    /// sqrt(token1/token0) as a Q64.96 fixed point number
    pub sqrt_price_x96: U160,
    pub tick: i32,
    pub token0: Address,
    pub token1: Address,
}

/// The latest observation of one poll cycle. Only the most recent is kept.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSample {
    pub dex_price_usd: f64,
    pub index_price_usd: Option<f64>,
    pub divergence_percent: Option<f64>,
    /// Quote asset (WBNB) USD price used for the conversion
    pub quote_price_usd: f64,
    pub pool: PoolReference,
    pub observed_at: DateTime<Utc>,
}

/// The four independently cooled-down alert conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertKind {
    PriceUpper,
    PriceLower,
    DivergenceUpper,
    DivergenceLower,
}

impl AlertKind {
    pub const ALL: [AlertKind; 4] = [
        AlertKind::PriceUpper,
        AlertKind::PriceLower,
        AlertKind::DivergenceUpper,
        AlertKind::DivergenceLower,
    ];
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AlertKind::PriceUpper => write!(f, "priceUpper"),
            AlertKind::PriceLower => write!(f, "priceLower"),
            AlertKind::DivergenceUpper => write!(f, "divergenceUpper"),
            AlertKind::DivergenceLower => write!(f, "divergenceLower"),
        }
    }
}

/// An alert decided by the engine, ready for delivery
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub kind: AlertKind,
    pub message: String,
}
