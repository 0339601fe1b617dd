//! Message formatting
//!
//! Pure functions that turn prices and settings into Telegram HTML text.
//! Nothing here reads the clock or performs I/O: timestamps are passed in,
//! so the same inputs always give the same message.

use super::settings::AlertSettings;
use crate::types::PriceSample;
use chrono::{DateTime, Duration, Utc};

/// Direction of a price threshold breach
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Breach {
    Upper,
    Lower,
}

/// Escape the three characters Telegram's HTML parse mode cares about
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

fn usd(price: Option<f64>) -> String {
    match price {
        Some(p) => format!("${:.6}", p),
        None => "N/A".to_string(),
    }
}

fn signed_percent(value: Option<f64>) -> String {
    match value {
        Some(d) => format!("{:+.3}%", d),
        None => "N/A".to_string(),
    }
}

pub fn price_alert(
    symbol: &str,
    breach: Breach,
    dex_price: f64,
    threshold: f64,
    at: DateTime<Utc>,
) -> String {
    let (emoji, direction) = match breach {
        Breach::Upper => ("🚀", "above upper"),
        Breach::Lower => ("📉", "below lower"),
    };
    format!(
        "{} <b>{} DEX Price Alert</b>\n\n\
         💰 DEX price: <b>${:.6}</b>\n\
         🎯 Threshold: ${:.4}\n\
         📊 Status: price {} threshold\n\n\
         ⏰ {}",
        emoji,
        escape_html(symbol),
        dex_price,
        threshold,
        direction,
        timestamp(at)
    )
}

pub fn divergence_alert(
    symbol: &str,
    dex_price: f64,
    index_price: f64,
    divergence: f64,
    at: DateTime<Utc>,
) -> String {
    let (emoji, status) = if divergence > 0.0 {
        ("⬆️", "DEX above index")
    } else {
        ("⬇️", "DEX below index")
    };
    format!(
        "{} <b>{} Divergence Alert</b>\n\n\
         🥞 PancakeSwap: <b>${:.6}</b>\n\
         📊 Binance Index: <b>${:.6}</b>\n\
         📐 Divergence: <b>{:+.3}%</b>\n\n\
         🔍 {}\n\n\
         ⏰ {}",
        emoji,
        escape_html(symbol),
        dex_price,
        index_price,
        divergence,
        status,
        timestamp(at)
    )
}

/// Reply to /price: the latest sample, or N/A fields before the first cycle
pub fn price_snapshot(symbol: &str, sample: Option<&PriceSample>, at: DateTime<Utc>) -> String {
    let (dex, index, divergence, observed) = match sample {
        Some(s) => (
            Some(s.dex_price_usd),
            s.index_price_usd,
            s.divergence_percent,
            timestamp(s.observed_at),
        ),
        None => (None, None, None, "no sample yet".to_string()),
    };
    format!(
        "💹 <b>Current {} Price</b>\n\n\
         🥞 PancakeSwap: <b>{}</b>\n\
         📊 Binance Index: <b>{}</b>\n\
         📐 Divergence: <b>{}</b>\n\n\
         🕒 Observed: {}\n\
         ⏰ {}",
        escape_html(symbol),
        usd(dex),
        usd(index),
        signed_percent(divergence),
        observed,
        timestamp(at)
    )
}

/// Reply to /status
pub fn status(settings: &AlertSettings, cooldown: Duration) -> String {
    let state = if settings.enabled { "🟢 enabled" } else { "🔴 disabled" };
    format!(
        "📊 <b>Current Settings</b>\n\n\
         <b>Alerts:</b> {}\n\n\
         <b>💰 DEX price alerts</b>\n\
         • Upper: ${}\n\
         • Lower: ${}\n\n\
         <b>📐 Divergence alerts</b>\n\
         • Upper: {}%\n\
         • Lower: {}%\n\n\
         ⏱ Cooldown: {}s",
        state,
        settings.dex_price_upper,
        settings.dex_price_lower,
        settings.divergence_upper,
        settings.divergence_lower,
        cooldown.num_seconds()
    )
}

/// Reply to /help and /start
pub fn help(symbol: &str) -> String {
    format!(
        "🤖 <b>{} Alert Bot Commands</b>\n\n\
         <b>📊 Queries</b>\n\
         /status - show current settings\n\
         /price - show current prices\n\n\
         <b>🔔 Alert control</b>\n\
         /on - enable alerts\n\
         /off - disable alerts\n\n\
         <b>💰 Price alerts</b>\n\
         /price_upper [value] - DEX price upper bound\n\
         /price_lower [value] - DEX price lower bound\n\n\
         <b>📐 Divergence alerts</b>\n\
         /div_upper [value] - divergence upper bound (%)\n\
         /div_lower [value] - divergence lower bound (%)\n\n\
         <b>Examples:</b>\n\
         /price_upper 0.55\n\
         /div_lower -2.0",
        escape_html(symbol)
    )
}

pub fn startup(symbol: &str) -> String {
    format!(
        "🤖 <b>{} Alert Bot Started</b>\n\n\
         Monitoring has begun.\n\
         Send /help for the command list.",
        escape_html(symbol)
    )
}

pub fn alerts_enabled() -> String {
    "✅ Alerts <b>enabled</b>.".to_string()
}

pub fn alerts_disabled() -> String {
    "🔕 Alerts <b>disabled</b>.".to_string()
}
