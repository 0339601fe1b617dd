//! Alert module
//!
//! Divergence calculation, per-kind cooldowns, the runtime settings store
//! and the decision engine that combines them. Message text lives in
//! `format` and is kept free of I/O.
//!
//! Created: 2026-10-19

pub mod cooldown;
pub mod divergence;
pub mod engine;
pub mod format;
pub mod settings;

pub use cooldown::{CooldownLedger, DEFAULT_ALERT_COOLDOWN_MS};
pub use divergence::divergence_percent;
pub use engine::AlertEngine;
pub use settings::{AlertSettings, SettingKey, SettingValue};
