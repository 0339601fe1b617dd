//! Configuration management
//! Load settings from the environment / .env file

use crate::alerts::{AlertSettings, DEFAULT_ALERT_COOLDOWN_MS};
use crate::feeds::binance::{DEFAULT_FUTURES_URL, DEFAULT_SPOT_URL};
use crate::notify::telegram::DEFAULT_API_URL;
use alloy::primitives::{address, Address};
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// TAKE on BNB Chain
pub const DEFAULT_TARGET_TOKEN: Address = address!("E747E54783Ba3F77a8E5251a3cBA19EBe9C0E197");
/// WBNB
pub const DEFAULT_QUOTE_TOKEN: Address = address!("bb4CdB9CBd36B01bD1cBaEBF2De08d9173bc095c");
/// PancakeSwap V3 factory on BNB Chain
pub const DEFAULT_PANCAKE_V3_FACTORY: Address = address!("0BFbCF9fa4f9C56B0F40a671Ad40E0805A091865");

const REQUIRED_VARS: [&str; 3] = ["RPC_URL", "TELEGRAM_BOT_TOKEN", "TELEGRAM_CHAT_ID"];

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub rpc_url: String,
    pub telegram_bot_token: String,
    pub telegram_chat_id: String,

    pub target_token: Address,
    pub quote_token: Address,
    pub pancake_v3_factory: Address,

    /// Display symbol of the monitored token
    pub token_symbol: String,
    /// Binance futures symbol for the index price
    pub index_symbol: String,
    /// Binance spot symbol for the quote asset's USD price
    pub quote_symbol: String,

    pub poll_interval_ms: u64,
    pub command_poll_interval_ms: u64,
    pub alert_cooldown_ms: i64,
    pub http_timeout_ms: u64,

    pub binance_futures_url: String,
    pub binance_spot_url: String,
    pub telegram_api_url: String,

    /// Optional TOML file with the initial alert thresholds (re-read on SIGHUP)
    pub alert_settings_file: Option<PathBuf>,
}

impl BotConfig {
    /// Build the config from a variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let missing: Vec<&str> = REQUIRED_VARS
            .iter()
            .copied()
            .filter(|&key| get(key).is_none())
            .collect();
        if !missing.is_empty() {
            bail!("Missing required environment variables: {}", missing.join(", "));
        }

        let required = |key: &str| get(key).with_context(|| format!("{} not set", key));
        let address_or = |key: &str, default: Address| -> Result<Address> {
            match get(key) {
                Some(v) => Address::from_str(&v).with_context(|| format!("Invalid address in {}: {}", key, v)),
                None => Ok(default),
            }
        };

        let token_symbol = get("TOKEN_SYMBOL").unwrap_or_else(|| "TAKE".to_string());
        let index_symbol = get("INDEX_SYMBOL").unwrap_or_else(|| format!("{}USDT", token_symbol));

        let config = BotConfig {
            rpc_url: required("RPC_URL")?,
            telegram_bot_token: required("TELEGRAM_BOT_TOKEN")?,
            telegram_chat_id: required("TELEGRAM_CHAT_ID")?,

            target_token: address_or("TARGET_TOKEN", DEFAULT_TARGET_TOKEN)?,
            quote_token: address_or("QUOTE_TOKEN", DEFAULT_QUOTE_TOKEN)?,
            pancake_v3_factory: address_or("PANCAKE_V3_FACTORY", DEFAULT_PANCAKE_V3_FACTORY)?,

            token_symbol,
            index_symbol,
            quote_symbol: get("QUOTE_SYMBOL").unwrap_or_else(|| "BNBUSDT".to_string()),

            poll_interval_ms: parse_or(&get, "POLL_INTERVAL_MS", 15_000)?,
            command_poll_interval_ms: parse_or(&get, "COMMAND_POLL_INTERVAL_MS", 2_000)?,
            alert_cooldown_ms: parse_or(&get, "ALERT_COOLDOWN_MS", DEFAULT_ALERT_COOLDOWN_MS)?,
            http_timeout_ms: parse_or(&get, "HTTP_TIMEOUT_MS", 10_000)?,

            binance_futures_url: get("BINANCE_FUTURES_URL").unwrap_or_else(|| DEFAULT_FUTURES_URL.to_string()),
            binance_spot_url: get("BINANCE_SPOT_URL").unwrap_or_else(|| DEFAULT_SPOT_URL.to_string()),
            telegram_api_url: get("TELEGRAM_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),

            alert_settings_file: get("ALERT_SETTINGS_FILE").map(PathBuf::from),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject values that parse but would stall the scheduler or defeat the cooldown
    fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            bail!("POLL_INTERVAL_MS must be greater than 0");
        }
        if self.command_poll_interval_ms == 0 {
            bail!("COMMAND_POLL_INTERVAL_MS must be greater than 0");
        }
        if self.alert_cooldown_ms < 0 {
            bail!("ALERT_COOLDOWN_MS must not be negative (got {})", self.alert_cooldown_ms);
        }
        if self.http_timeout_ms == 0 {
            bail!("HTTP_TIMEOUT_MS must be greater than 0");
        }
        Ok(())
    }

    /// Initial thresholds: the settings file if configured, defaults otherwise
    pub fn initial_alert_settings(&self) -> Result<AlertSettings> {
        match &self.alert_settings_file {
            Some(path) => AlertSettings::load(path),
            None => Ok(AlertSettings::default()),
        }
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(v) => v.parse().with_context(|| format!("Invalid value for {}: {}", key, v)),
        None => Ok(default),
    }
}

pub fn load_config() -> Result<BotConfig> {
    dotenv::dotenv().ok();
    BotConfig::from_lookup(|key| std::env::var(key).ok())
}

/// Load a specific env file, then read the process environment
pub fn load_config_from_file<P: AsRef<Path>>(path: P) -> Result<BotConfig> {
    dotenv::from_path(path.as_ref())
        .with_context(|| format!("Failed to load env file: {}", path.as_ref().display()))?;
    BotConfig::from_lookup(|key| std::env::var(key).ok())
}
