//! Operator Command Interpreter
//!
//! Parses chat commands and applies them to the alert engine. Threshold
//! commands go through the settings store's keyed update; query commands
//! only read. Unrecognized commands produce no reply at all.
//!
//! Created: 2026-10-19

use crate::alerts::format;
use crate::alerts::{AlertEngine, SettingKey, SettingValue};
use crate::error::MonitorError;
use crate::types::PriceSample;
use chrono::{DateTime, Utc};
use std::str::FromStr;
use thiserror::Error;
use tracing::{info, warn};

/// The four operator-adjustable thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Threshold {
    PriceUpper,
    PriceLower,
    DivergenceUpper,
    DivergenceLower,
}

impl Threshold {
    pub fn command(&self) -> &'static str {
        match self {
            Threshold::PriceUpper => "/price_upper",
            Threshold::PriceLower => "/price_lower",
            Threshold::DivergenceUpper => "/div_upper",
            Threshold::DivergenceLower => "/div_lower",
        }
    }

    pub fn setting_key(&self) -> SettingKey {
        match self {
            Threshold::PriceUpper => SettingKey::DexPriceUpper,
            Threshold::PriceLower => SettingKey::DexPriceLower,
            Threshold::DivergenceUpper => SettingKey::DivergenceUpper,
            Threshold::DivergenceLower => SettingKey::DivergenceLower,
        }
    }

    fn example(&self) -> &'static str {
        match self {
            Threshold::PriceUpper => "0.60",
            Threshold::PriceLower => "0.35",
            Threshold::DivergenceUpper => "1.5",
            Threshold::DivergenceLower => "-1.5",
        }
    }

    fn confirmation(&self, value: f64) -> String {
        match self {
            Threshold::PriceUpper => format!("✅ DEX price upper bound set to <b>${}</b>", value),
            Threshold::PriceLower => format!("✅ DEX price lower bound set to <b>${}</b>", value),
            Threshold::DivergenceUpper => format!("✅ Divergence upper bound set to <b>{}%</b>", value),
            Threshold::DivergenceLower => format!("✅ Divergence lower bound set to <b>{}%</b>", value),
        }
    }

    fn usage(&self) -> String {
        format!("❌ Usage: {} {}", self.command(), self.example())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Help,
    Status,
    Price,
    Enable,
    Disable,
    SetThreshold(Threshold, f64),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unrecognized command")]
    Unrecognized,
    #[error("missing or invalid argument for {}", .0.command())]
    InvalidArgument(Threshold),
}

/// Strict float parse: the whole token must be a finite number
fn parse_number(token: Option<&str>) -> Result<f64, MonitorError> {
    let token = token.unwrap_or_default();
    match f64::from_str(token) {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(MonitorError::Parse(token.to_string())),
    }
}

impl Command {
    pub fn parse(text: &str) -> Result<Self, CommandError> {
        let mut tokens = text.split_whitespace();
        let head = tokens.next().ok_or(CommandError::Unrecognized)?;
        // "/price@my_bot" addresses this bot in group chats
        let head = head.split('@').next().unwrap_or(head).to_lowercase();

        let threshold = match head.as_str() {
            "/start" | "/help" => return Ok(Command::Help),
            "/status" => return Ok(Command::Status),
            "/price" => return Ok(Command::Price),
            "/on" => return Ok(Command::Enable),
            "/off" => return Ok(Command::Disable),
            "/price_upper" => Threshold::PriceUpper,
            "/price_lower" => Threshold::PriceLower,
            "/div_upper" => Threshold::DivergenceUpper,
            "/div_lower" => Threshold::DivergenceLower,
            _ => return Err(CommandError::Unrecognized),
        };

        let value = parse_number(tokens.next()).map_err(|_| CommandError::InvalidArgument(threshold))?;
        Ok(Command::SetThreshold(threshold, value))
    }
}

/// Interpret one operator text. Returns the reply to send, or None when the
/// text is not a command this bot knows.
pub fn interpret(
    text: &str,
    engine: &mut AlertEngine,
    latest: Option<&PriceSample>,
    now: DateTime<Utc>,
) -> Option<String> {
    let command = match Command::parse(text) {
        Ok(command) => command,
        Err(CommandError::Unrecognized) => return None,
        Err(CommandError::InvalidArgument(threshold)) => return Some(threshold.usage()),
    };

    let reply = match command {
        Command::Help => format::help(engine.symbol()),
        Command::Status => format::status(engine.settings(), engine.ledger().cooldown()),
        Command::Price => format::price_snapshot(engine.symbol(), latest, now),
        Command::Enable => match engine.set(SettingKey::Enabled, SettingValue::Flag(true)) {
            Ok(()) => {
                info!("Alerts enabled by operator");
                format::alerts_enabled()
            }
            Err(e) => failure(e),
        },
        Command::Disable => match engine.set(SettingKey::Enabled, SettingValue::Flag(false)) {
            Ok(()) => {
                info!("Alerts disabled by operator");
                format::alerts_disabled()
            }
            Err(e) => failure(e),
        },
        Command::SetThreshold(threshold, value) => {
            match engine.set(threshold.setting_key(), SettingValue::Number(value)) {
                Ok(()) => {
                    info!("Threshold {} set to {}", threshold.setting_key(), value);
                    threshold.confirmation(value)
                }
                Err(e) => failure(e),
            }
        }
    };
    Some(reply)
}

fn failure(err: MonitorError) -> String {
    warn!("Command failed: {}", err);
    format!("❌ {}", format::escape_html(&err.to_string()))
}
