//! DEX Price Alert Bot
//!
//! Main entry point. Polls the TAKE/WBNB PancakeSwap V3 pool every
//! POLL_INTERVAL_MS, prices it in USD via Binance BNBUSDT, compares with the
//! Binance futures index price and sends threshold alerts to Telegram.
//! Operator commands (/status, /price_upper 0.55, ...) are polled from the
//! same chat every COMMAND_POLL_INTERVAL_MS.
//!
//! Usage:
//!   dexalert-bot                       # .env from the working directory
//!   dexalert-bot --env-file .env.prod
//!   dexalert-bot --dry-run --once      # one cycle, messages to the log
//!
//! Created: 2026-10-19

use alloy::providers::{Provider, ProviderBuilder};
use anyhow::{Context, Result};
use clap::Parser;
use dexalert_bot::alerts::AlertEngine;
use dexalert_bot::config::{load_config, load_config_from_file};
use dexalert_bot::feeds::{BinanceClient, ReferencePriceSource};
use dexalert_bot::monitor::{scheduler, Monitor, MonitoredPair, SchedulerConfig};
use dexalert_bot::notify::{CommandSource, LogSink, MessageSink, TelegramClient};
use dexalert_bot::pool::{FactoryPoolLookup, OnChainPoolReader, PoolLocator};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

/// DEX price alert bot (PancakeSwap V3 vs Binance index)
#[derive(Parser)]
#[command(name = "dexalert-bot")]
struct Args {
    /// Env file to load instead of ./.env
    #[arg(long, env = "ENV_FILE")]
    env_file: Option<PathBuf>,

    /// Write messages to the log instead of sending them to Telegram
    #[arg(long)]
    dry_run: bool,

    /// Run a single poll cycle and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();

    let config = match &args.env_file {
        Some(path) => load_config_from_file(path)?,
        None => load_config()?,
    };

    info!("===========================================");
    info!("   {} DEX Price Alert Bot", config.token_symbol);
    info!("   PancakeSwap V3 vs Binance index");
    info!("===========================================");
    info!("Target token: {:?}", config.target_token);
    info!("Quote token: {:?} ({})", config.quote_token, config.quote_symbol);
    info!("Factory: {:?}", config.pancake_v3_factory);
    info!("Index symbol: {}", config.index_symbol);
    info!("RPC URL: {}", config.rpc_url.chars().take(40).collect::<String>());
    info!("Poll interval: {}ms, command interval: {}ms", config.poll_interval_ms, config.command_poll_interval_ms);
    info!("Alert cooldown: {}ms", config.alert_cooldown_ms);
    if args.dry_run {
        warn!("Dry run: messages are logged, not sent");
    }

    let settings = config
        .initial_alert_settings()
        .context("Failed to load initial alert settings")?;
    info!("Alert settings: {:?}", settings);

    // RPC provider (HTTP)
    let provider = ProviderBuilder::new()
        .connect_http(config.rpc_url.parse().context("Invalid RPC URL")?);
    let provider = Arc::new(provider);
    match provider.get_chain_id().await {
        Ok(chain_id) => info!("Connected to chain {}", chain_id),
        Err(e) => warn!("RPC not reachable yet, will retry every cycle: {}", e),
    }

    let http_timeout = Duration::from_millis(config.http_timeout_ms);

    let telegram = Arc::new(TelegramClient::new(
        config.telegram_api_url.clone(),
        config.telegram_bot_token.clone(),
        config.telegram_chat_id.clone(),
        http_timeout,
    )?);
    let sink: Arc<dyn MessageSink> = if args.dry_run {
        Arc::new(LogSink)
    } else {
        telegram.clone()
    };
    let commands: Arc<dyn CommandSource> = telegram;

    let prices: Arc<dyn ReferencePriceSource> = Arc::new(BinanceClient::new(
        config.binance_futures_url.clone(),
        config.binance_spot_url.clone(),
        config.index_symbol.clone(),
        config.quote_symbol.clone(),
        http_timeout,
    )?);

    let locator = PoolLocator::new(Arc::new(FactoryPoolLookup::new(
        Arc::clone(&provider),
        config.pancake_v3_factory,
    )));
    let pool_reader = Arc::new(OnChainPoolReader::new(Arc::clone(&provider)));

    let engine = AlertEngine::new(
        settings,
        chrono::Duration::milliseconds(config.alert_cooldown_ms),
        config.token_symbol.clone(),
    );

    let monitor = Arc::new(Monitor::new(
        MonitoredPair {
            target_token: config.target_token,
            quote_token: config.quote_token,
        },
        engine,
        locator,
        pool_reader,
        prices,
        sink,
        commands,
    ));

    if args.once {
        match monitor.on_poll_tick().await {
            Some(sample) => info!("Single cycle complete: pool {}", sample.pool),
            None => warn!("Single cycle produced no sample"),
        }
        return Ok(());
    }

    monitor.announce_startup().await;

    scheduler::run(
        monitor,
        SchedulerConfig {
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            command_interval: Duration::from_millis(config.command_poll_interval_ms),
            settings_file: config.alert_settings_file.clone(),
        },
    )
    .await?;

    info!("Bot stopped");
    Ok(())
}
