//! Alert Decision Engine
//!
//! Owns the alert settings and the cooldown ledger, and decides per poll
//! cycle which alerts fire. The four checks are independent; several can
//! fire in the same cycle. Disabled settings short-circuit the whole
//! evaluation (the ledger is not touched either).
//!
//! Evaluation is synchronous and side-effect free apart from the ledger
//! update. Delivering the returned alerts is the caller's job.

use super::cooldown::CooldownLedger;
use super::format::{self, Breach};
use super::settings::{AlertSettings, SettingKey, SettingValue};
use crate::error::MonitorResult;
use crate::types::{Alert, AlertKind, PriceSample};
use chrono::Duration;
use tracing::info;

pub struct AlertEngine {
    settings: AlertSettings,
    ledger: CooldownLedger,
    symbol: String,
}

impl AlertEngine {
    pub fn new(settings: AlertSettings, cooldown: Duration, symbol: impl Into<String>) -> Self {
        Self {
            settings,
            ledger: CooldownLedger::new(cooldown),
            symbol: symbol.into(),
        }
    }

    pub fn settings(&self) -> &AlertSettings {
        &self.settings
    }

    pub fn ledger(&self) -> &CooldownLedger {
        &self.ledger
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Keyed settings update (see `AlertSettings::update`)
    pub fn update_setting(&mut self, key: &str, value: impl Into<SettingValue>) -> MonitorResult<()> {
        self.settings.update(key, value)
    }

    pub fn set(&mut self, key: SettingKey, value: SettingValue) -> MonitorResult<()> {
        self.settings.set(key, value)
    }

    /// Decide which alerts fire for this sample. `sample.observed_at` is the
    /// clock for the cooldown checks.
    pub fn evaluate(&mut self, sample: &PriceSample) -> Vec<Alert> {
        let mut alerts = Vec::new();
        if !self.settings.enabled {
            return alerts;
        }

        let now = sample.observed_at;
        let price = sample.dex_price_usd;
        let s = self.settings;

        if price >= s.dex_price_upper && self.ledger.try_fire(AlertKind::PriceUpper, now) {
            alerts.push(Alert {
                kind: AlertKind::PriceUpper,
                message: format::price_alert(&self.symbol, Breach::Upper, price, s.dex_price_upper, now),
            });
        }

        if price <= s.dex_price_lower && self.ledger.try_fire(AlertKind::PriceLower, now) {
            alerts.push(Alert {
                kind: AlertKind::PriceLower,
                message: format::price_alert(&self.symbol, Breach::Lower, price, s.dex_price_lower, now),
            });
        }

        if let (Some(divergence), Some(index)) = (sample.divergence_percent, sample.index_price_usd) {
            if divergence >= s.divergence_upper && self.ledger.try_fire(AlertKind::DivergenceUpper, now) {
                alerts.push(Alert {
                    kind: AlertKind::DivergenceUpper,
                    message: format::divergence_alert(&self.symbol, price, index, divergence, now),
                });
            }

            if divergence <= s.divergence_lower && self.ledger.try_fire(AlertKind::DivergenceLower, now) {
                alerts.push(Alert {
                    kind: AlertKind::DivergenceLower,
                    message: format::divergence_alert(&self.symbol, price, index, divergence, now),
                });
            }
        }

        for alert in &alerts {
            info!("Alert fired: {}", alert.kind);
        }
        alerts
    }
}
