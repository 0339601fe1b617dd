//! DEX Price Alert Bot Library
//!
//! Watches a PancakeSwap V3 pool on BNB Chain, converts its spot price to
//! USD, compares it with the Binance index price and alerts a Telegram chat
//! when thresholds are crossed. Thresholds are adjustable from the chat.
//!
//! Created: 2026-10-19

pub mod alerts;
pub mod commands;
pub mod config;
pub mod contracts;
pub mod error;
pub mod feeds;
pub mod monitor;
pub mod notify;
pub mod pool;
pub mod types;

// Re-export commonly used types
pub use alerts::{AlertEngine, AlertSettings};
pub use config::{load_config, load_config_from_file, BotConfig};
pub use error::{MonitorError, MonitorResult};
pub use monitor::Monitor;
pub use types::{Alert, AlertKind, PoolReference, PriceSample, RawPoolState};
