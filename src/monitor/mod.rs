//! Price Monitor
//!
//! Owns the shared state (alert engine, latest sample, command cursor) and
//! runs the two periodic activities:
//!
//!   - poll: locate pool -> read pool state, index price and quote price
//!     concurrently -> USD price -> divergence -> alerts -> delivery
//!   - command: pull operator texts -> interpret -> reply
//!
//! The state mutex is only held for synchronous work. Every network call,
//! delivery included, happens with the lock released.
//!
//! Created: 2026-10-19

pub mod scheduler;

pub use scheduler::{SchedulerConfig, TickGuard};

use crate::alerts::{divergence_percent, format, AlertEngine, AlertSettings, SettingKey};
use crate::commands;
use crate::feeds::ReferencePriceSource;
use crate::notify::{CommandSource, MessageSink};
use crate::pool::{PoolLocator, PoolStateReader};
use crate::types::PriceSample;
use alloy::primitives::Address;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Which pool the monitor prices: `target` quoted in `quote`
#[derive(Debug, Clone, Copy)]
pub struct MonitoredPair {
    pub target_token: Address,
    pub quote_token: Address,
}

struct MonitorState {
    engine: AlertEngine,
    latest: Option<PriceSample>,
    /// Highest update id already handled
    command_cursor: Option<i64>,
}

pub struct Monitor {
    pair: MonitoredPair,
    locator: PoolLocator,
    pool_reader: Arc<dyn PoolStateReader>,
    prices: Arc<dyn ReferencePriceSource>,
    sink: Arc<dyn MessageSink>,
    commands: Arc<dyn CommandSource>,
    state: Mutex<MonitorState>,
    poll_guard: TickGuard,
    command_guard: TickGuard,
}

impl Monitor {
    pub fn new(
        pair: MonitoredPair,
        engine: AlertEngine,
        locator: PoolLocator,
        pool_reader: Arc<dyn PoolStateReader>,
        prices: Arc<dyn ReferencePriceSource>,
        sink: Arc<dyn MessageSink>,
        commands: Arc<dyn CommandSource>,
    ) -> Self {
        Self {
            pair,
            locator,
            pool_reader,
            prices,
            sink,
            commands,
            state: Mutex::new(MonitorState {
                engine,
                latest: None,
                command_cursor: None,
            }),
            poll_guard: TickGuard::new(),
            command_guard: TickGuard::new(),
        }
    }

    pub async fn latest_sample(&self) -> Option<PriceSample> {
        self.state.lock().await.latest.clone()
    }

    pub async fn settings(&self) -> AlertSettings {
        *self.state.lock().await.engine.settings()
    }

    /// Replace the four thresholds through the keyed update (SIGHUP reload).
    /// The on/off switch belongs to the operator and is left as it is.
    pub async fn apply_settings(&self, settings: AlertSettings) {
        let mut state = self.state.lock().await;
        for key in SettingKey::ALL {
            if key == SettingKey::Enabled {
                continue;
            }
            if let Err(e) = state.engine.set(key, settings.get(key)) {
                warn!("Reload of {} rejected: {}", key, e);
            }
        }
    }

    /// Send the start-up banner
    pub async fn announce_startup(&self) {
        let text = {
            let state = self.state.lock().await;
            format::startup(state.engine.symbol())
        };
        self.send(&text).await;
    }

    async fn send(&self, text: &str) {
        if let Err(e) = self.sink.deliver(text).await {
            error!("Message delivery failed: {}", e);
        }
    }

    /// One poll cycle. Returns the stored sample, or None when the cycle was
    /// skipped (previous cycle still running, pool or quote price missing).
    pub async fn on_poll_tick(&self) -> Option<PriceSample> {
        let Some(_permit) = self.poll_guard.try_enter() else {
            debug!("Poll cycle still running, skipping tick");
            return None;
        };

        let MonitoredPair { target_token, quote_token } = self.pair;

        let pool = match self.locator.locate(target_token, quote_token).await {
            Ok(pool) => pool,
            Err(e) => {
                warn!("Pool lookup failed: {}", e);
                return None;
            }
        };

        let (pool_state, index_price, quote_price) = tokio::join!(
            self.pool_reader.read_pool_state(&pool),
            self.prices.index_price_usd(),
            self.prices.quote_price_usd(),
        );

        let price_in_quote = match pool_state.and_then(|s| s.price_of(target_token, quote_token)) {
            Ok(price) => price,
            Err(e) => {
                warn!("DEX price unavailable: {}", e);
                return None;
            }
        };

        let quote_price_usd = match quote_price {
            Ok(Some(price)) => price,
            Ok(None) => {
                warn!("Quote asset USD price missing, skipping cycle");
                return None;
            }
            Err(e) => {
                warn!("Quote asset USD price unavailable, skipping cycle: {}", e);
                return None;
            }
        };

        let index_price_usd = index_price.unwrap_or_else(|e| {
            warn!("Index price unavailable: {}", e);
            None
        });

        let dex_price_usd = price_in_quote * quote_price_usd;
        let sample = PriceSample {
            dex_price_usd,
            index_price_usd,
            divergence_percent: divergence_percent(dex_price_usd, index_price_usd),
            quote_price_usd,
            pool,
            observed_at: Utc::now(),
        };

        let (alerts, enabled) = {
            let mut state = self.state.lock().await;
            state.latest = Some(sample.clone());
            let alerts = state.engine.evaluate(&sample);
            (alerts, state.engine.settings().enabled)
        };

        info!(
            "DEX ${:.6} | Index {} | Div {} | Alerts {}",
            sample.dex_price_usd,
            sample
                .index_price_usd
                .map(|p| format!("${:.6}", p))
                .unwrap_or_else(|| "N/A".to_string()),
            sample
                .divergence_percent
                .map(|d| format!("{:+.3}%", d))
                .unwrap_or_else(|| "N/A".to_string()),
            if enabled { "ON" } else { "OFF" }
        );

        for alert in &alerts {
            self.send(&alert.message).await;
        }

        Some(sample)
    }

    /// One command cycle. Returns how many commands produced a reply.
    pub async fn on_command_tick(&self) -> usize {
        let Some(_permit) = self.command_guard.try_enter() else {
            debug!("Command cycle still running, skipping tick");
            return 0;
        };

        let cursor = self.state.lock().await.command_cursor;
        let mut updates = match self.commands.receive(cursor).await {
            Ok(updates) => updates,
            Err(e) => {
                warn!("Fetching commands failed: {}", e);
                return 0;
            }
        };
        updates.sort_by_key(|u| u.update_id);

        let mut replied = 0;
        for update in updates {
            let reply = {
                let mut state = self.state.lock().await;
                if state.command_cursor.is_some_and(|c| update.update_id <= c) {
                    debug!("Dropping already handled update {}", update.update_id);
                    continue;
                }
                state.command_cursor = Some(update.update_id);

                let Some(text) = update.text else {
                    continue;
                };
                let MonitorState { engine, latest, .. } = &mut *state;
                commands::interpret(&text, engine, latest.as_ref(), Utc::now())
            };

            if let Some(reply) = reply {
                self.send(&reply).await;
                replied += 1;
            }
        }
        replied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{MonitorError, MonitorResult};
    use crate::notify::CommandUpdate;
    use crate::pool::PoolLookup;
    use crate::types::{PoolReference, RawPoolState};
    use alloy::primitives::{address, U160};
    use async_trait::async_trait;
    use chrono::Duration;
    use std::sync::Mutex as StdMutex;

    const TAKE: Address = address!("E747E54783Ba3F77a8E5251a3cBA19EBe9C0E197");
    const WBNB: Address = address!("bb4CdB9CBd36B01bD1cBaEBF2De08d9173bc095c");
    const POOL: Address = address!("00000000000000000000000000000000000000aa");

    struct SingleTierFactory;

    #[async_trait]
    impl PoolLookup for SingleTierFactory {
        async fn pool_address(&self, _a: Address, _b: Address, fee_tier: u32) -> MonitorResult<Address> {
            Ok(if fee_tier == 2500 { POOL } else { Address::ZERO })
        }
    }

    /// Pool at sqrt(1/1000) * 2^96: WBNB is token0, TAKE is token1, so one
    /// TAKE is worth 0.001 WBNB.
    struct FixedPool;

    #[async_trait]
    impl PoolStateReader for FixedPool {
        async fn read_pool_state(&self, _pool: &PoolReference) -> MonitorResult<RawPoolState> {
            // 2^96 * sqrt(1000)
            let sqrt = U160::from(2505414483750479311864138015696u128);
            Ok(RawPoolState { sqrt_price_x96: sqrt, tick: 69081, token0: WBNB, token1: TAKE })
        }
    }

    struct FixedPrices {
        index: MonitorResult<Option<f64>>,
        quote: Option<f64>,
    }

    #[async_trait]
    impl ReferencePriceSource for FixedPrices {
        async fn index_price_usd(&self) -> MonitorResult<Option<f64>> {
            match &self.index {
                Ok(v) => Ok(*v),
                Err(_) => Err(MonitorError::fetch("test", "down")),
            }
        }

        async fn quote_price_usd(&self) -> MonitorResult<Option<f64>> {
            Ok(self.quote)
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        sent: StdMutex<Vec<String>>,
    }

    #[async_trait]
    impl MessageSink for RecordingSink {
        async fn deliver(&self, text: &str) -> MonitorResult<()> {
            self.sent.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    #[derive(Default)]
    struct ScriptedCommands {
        batches: StdMutex<Vec<Vec<CommandUpdate>>>,
        seen_cursors: StdMutex<Vec<Option<i64>>>,
    }

    #[async_trait]
    impl CommandSource for ScriptedCommands {
        async fn receive(&self, since: Option<i64>) -> MonitorResult<Vec<CommandUpdate>> {
            self.seen_cursors.lock().unwrap().push(since);
            let mut batches = self.batches.lock().unwrap();
            Ok(if batches.is_empty() { Vec::new() } else { batches.remove(0) })
        }
    }

    fn update(id: i64, text: Option<&str>) -> CommandUpdate {
        CommandUpdate { update_id: id, text: text.map(str::to_string) }
    }

    /// Factory with no pool at any tier
    struct EmptyFactory;

    #[async_trait]
    impl PoolLookup for EmptyFactory {
        async fn pool_address(&self, _a: Address, _b: Address, _fee_tier: u32) -> MonitorResult<Address> {
            Ok(Address::ZERO)
        }
    }

    /// Pool that pairs TAKE with some other token instead of WBNB
    struct ForeignPool;

    #[async_trait]
    impl PoolStateReader for ForeignPool {
        async fn read_pool_state(&self, _pool: &PoolReference) -> MonitorResult<RawPoolState> {
            Ok(RawPoolState {
                sqrt_price_x96: U160::from(1u128 << 96),
                tick: 0,
                token0: address!("55d398326f99059fF775485246999027B3197955"),
                token1: TAKE,
            })
        }
    }

    fn monitor_with(
        lookup: Arc<dyn PoolLookup>,
        reader: Arc<dyn PoolStateReader>,
        prices: FixedPrices,
        sink: Arc<RecordingSink>,
        commands: Arc<ScriptedCommands>,
    ) -> Monitor {
        let engine = AlertEngine::new(AlertSettings::default(), Duration::milliseconds(300_000), "TAKE");
        Monitor::new(
            MonitoredPair { target_token: TAKE, quote_token: WBNB },
            engine,
            PoolLocator::new(lookup),
            reader,
            Arc::new(prices),
            sink,
            commands,
        )
    }

    fn monitor(
        prices: FixedPrices,
        sink: Arc<RecordingSink>,
        commands: Arc<ScriptedCommands>,
    ) -> Monitor {
        monitor_with(Arc::new(SingleTierFactory), Arc::new(FixedPool), prices, sink, commands)
    }

    #[tokio::test]
    async fn test_poll_cycle_converts_to_usd_and_alerts() {
        let sink = Arc::new(RecordingSink::default());
        // 0.001 WBNB * $620 = $0.62, above the 0.60 default
        let prices = FixedPrices { index: Ok(Some(0.62)), quote: Some(620.0) };
        let monitor = monitor(prices, Arc::clone(&sink), Arc::default());

        let sample = monitor.on_poll_tick().await.unwrap();
        assert!((sample.dex_price_usd - 0.62).abs() < 1e-9);
        assert_eq!(sample.pool.fee_tier, 2500);
        assert!(sample.divergence_percent.unwrap().abs() < 1e-6);
        assert_eq!(monitor.latest_sample().await, Some(sample));

        let sent = sink.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("DEX Price Alert"));
    }

    #[tokio::test]
    async fn test_second_cycle_within_cooldown_is_silent() {
        let sink = Arc::new(RecordingSink::default());
        let prices = FixedPrices { index: Ok(None), quote: Some(630.0) };
        let monitor = monitor(prices, Arc::clone(&sink), Arc::default());

        monitor.on_poll_tick().await.unwrap();
        monitor.on_poll_tick().await.unwrap();
        assert_eq!(sink.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_quote_price_skips_cycle() {
        let sink = Arc::new(RecordingSink::default());
        let prices = FixedPrices { index: Ok(Some(0.5)), quote: None };
        let monitor = monitor(prices, Arc::clone(&sink), Arc::default());

        assert!(monitor.on_poll_tick().await.is_none());
        assert!(monitor.latest_sample().await.is_none());
        assert!(sink.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_index_failure_leaves_divergence_empty() {
        let sink = Arc::new(RecordingSink::default());
        let prices = FixedPrices { index: Err(MonitorError::fetch("test", "down")), quote: Some(500.0) };
        let monitor = monitor(prices, Arc::clone(&sink), Arc::default());

        let sample = monitor.on_poll_tick().await.unwrap();
        assert_eq!(sample.index_price_usd, None);
        assert_eq!(sample.divergence_percent, None);
        // $0.50 is inside the default range
        assert!(sink.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_commands_applied_and_cursor_dedupes() {
        let sink = Arc::new(RecordingSink::default());
        let commands = Arc::new(ScriptedCommands::default());
        *commands.batches.lock().unwrap() = vec![
            vec![update(5, Some("/price_upper 0.55")), update(6, None), update(7, Some("hello"))],
            // Redelivered ids are dropped
            vec![update(6, Some("/off")), update(7, Some("/off")), update(8, Some("/status"))],
        ];
        let prices = FixedPrices { index: Ok(None), quote: Some(500.0) };
        let monitor = monitor(prices, Arc::clone(&sink), Arc::clone(&commands));

        assert_eq!(monitor.on_command_tick().await, 1);
        assert_eq!(monitor.settings().await.dex_price_upper, 0.55);

        assert_eq!(monitor.on_command_tick().await, 1);
        assert!(monitor.settings().await.enabled);

        assert_eq!(*commands.seen_cursors.lock().unwrap(), vec![None, Some(7)]);
        assert_eq!(sink.sent.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_disable_command_silences_alerts() {
        let sink = Arc::new(RecordingSink::default());
        let commands = Arc::new(ScriptedCommands::default());
        *commands.batches.lock().unwrap() = vec![vec![update(1, Some("/off"))]];
        let prices = FixedPrices { index: Ok(Some(0.40)), quote: Some(700.0) };
        let monitor = monitor(prices, Arc::clone(&sink), Arc::clone(&commands));

        monitor.on_command_tick().await;
        monitor.on_poll_tick().await.unwrap();

        let sent = sink.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("disabled"));
    }

    #[tokio::test]
    async fn test_price_command_reports_latest_sample() {
        let sink = Arc::new(RecordingSink::default());
        let commands = Arc::new(ScriptedCommands::default());
        *commands.batches.lock().unwrap() = vec![vec![update(1, Some("/price"))]];
        let prices = FixedPrices { index: Ok(None), quote: Some(500.0) };
        let monitor = monitor(prices, Arc::clone(&sink), Arc::clone(&commands));

        monitor.on_poll_tick().await.unwrap();
        monitor.on_command_tick().await;

        let sent = sink.sent.lock().unwrap().clone();
        assert!(sent.last().unwrap().contains("$0.500000"));
    }

    #[tokio::test]
    async fn test_apply_settings_and_startup_banner() {
        let sink = Arc::new(RecordingSink::default());
        let prices = FixedPrices { index: Ok(None), quote: Some(500.0) };
        let monitor = monitor(prices, Arc::clone(&sink), Arc::default());

        let reloaded = AlertSettings { dex_price_upper: 0.45, ..AlertSettings::default() };
        monitor.apply_settings(reloaded).await;
        assert_eq!(monitor.settings().await, reloaded);

        monitor.announce_startup().await;
        assert!(sink.sent.lock().unwrap()[0].contains("Alert Bot Started"));
    }

    #[tokio::test]
    async fn test_pool_not_found_skips_cycle() {
        let sink = Arc::new(RecordingSink::default());
        // $0.70 would breach the upper threshold if the cycle ran
        let prices = FixedPrices { index: Ok(Some(0.5)), quote: Some(700.0) };
        let monitor = monitor_with(Arc::new(EmptyFactory), Arc::new(FixedPool), prices, Arc::clone(&sink), Arc::default());

        assert!(monitor.on_poll_tick().await.is_none());
        assert!(monitor.latest_sample().await.is_none());
        assert!(sink.sent.lock().unwrap().is_empty());
        assert!(monitor.locator.cached(TAKE, WBNB).is_none());
    }

    #[tokio::test]
    async fn test_token_mismatch_skips_cycle() {
        let sink = Arc::new(RecordingSink::default());
        let prices = FixedPrices { index: Ok(Some(0.5)), quote: Some(700.0) };
        let monitor = monitor_with(Arc::new(SingleTierFactory), Arc::new(ForeignPool), prices, Arc::clone(&sink), Arc::default());

        assert!(monitor.on_poll_tick().await.is_none());
        assert!(monitor.latest_sample().await.is_none());
        assert!(sink.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_poll_tick_skipped_while_previous_running() {
        let sink = Arc::new(RecordingSink::default());
        let prices = FixedPrices { index: Ok(None), quote: Some(700.0) };
        let monitor = monitor(prices, Arc::clone(&sink), Arc::default());

        let permit = monitor.poll_guard.try_enter().unwrap();
        assert!(monitor.on_poll_tick().await.is_none());
        assert!(monitor.latest_sample().await.is_none());
        assert!(sink.sent.lock().unwrap().is_empty());

        drop(permit);
        assert!(monitor.on_poll_tick().await.is_some());
        assert_eq!(sink.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reload_keeps_operator_switch() {
        let sink = Arc::new(RecordingSink::default());
        let commands = Arc::new(ScriptedCommands::default());
        *commands.batches.lock().unwrap() = vec![vec![update(1, Some("/off"))]];
        let prices = FixedPrices { index: Ok(None), quote: Some(500.0) };
        let monitor = monitor(prices, Arc::clone(&sink), Arc::clone(&commands));

        monitor.on_command_tick().await;
        let from_file = AlertSettings { enabled: true, divergence_upper: 2.5, ..AlertSettings::default() };
        monitor.apply_settings(from_file).await;

        let settings = monitor.settings().await;
        assert!(!settings.enabled);
        assert_eq!(settings.divergence_upper, 2.5);
    }
}
