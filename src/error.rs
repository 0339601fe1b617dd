//! Error types for the price monitor
//!
//! Every failure inside a poll or command cycle is one of these variants.
//! None of them is fatal: the monitor logs the error and degrades the
//! current cycle. Start-up configuration errors use `anyhow` instead.
//!
//! Created: 2026-10-19

use alloy::primitives::Address;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MonitorError {
    /// Network or API failure in one of the external collaborators
    #[error("fetch failed ({source_name}): {message}")]
    Fetch {
        source_name: &'static str,
        message: String,
    },

    /// No fee tier of the factory returned a pool for the pair
    #[error("no pool found for {token_a:?}/{token_b:?} in any fee tier")]
    PoolNotFound { token_a: Address, token_b: Address },

    /// The pool's token ordering does not contain the expected assets
    #[error(
        "pool tokens ({token0:?}, {token1:?}) do not match reference {reference:?} / target {target:?}"
    )]
    AddressMismatch {
        token0: Address,
        token1: Address,
        reference: Address,
        target: Address,
    },

    /// sqrtPriceX96 of zero: pool exists but was never initialized
    #[error("pool has no price (sqrtPriceX96 = 0)")]
    UninitializedPool,

    /// Command argument could not be parsed as a number
    #[error("cannot parse {0:?} as a number")]
    Parse(String),

    /// Configuration key not recognized by the settings store
    #[error("unknown setting key: {0}")]
    UnknownKey(String),

    /// Value type does not fit the setting (flag for a threshold or vice versa)
    #[error("invalid value for setting {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// Message delivery failed
    #[error("delivery failed: {0}")]
    Delivery(String),
}

impl MonitorError {
    pub fn fetch(source_name: &'static str, err: impl std::fmt::Display) -> Self {
        MonitorError::Fetch {
            source_name,
            message: err.to_string(),
        }
    }
}

pub type MonitorResult<T> = std::result::Result<T, MonitorError>;
