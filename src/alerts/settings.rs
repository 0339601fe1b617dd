//! Alert settings store
//!
//! Runtime-mutable alert configuration. All mutation goes through the keyed
//! update operation; unknown keys are rejected without touching the store.
//!
//! Range sanity (lower <= upper) is not checked: an operator can
//! set an inverted range, which makes the corresponding check fire on every
//! price (or never, depending on the side). The store keeps whatever it is
//! given.

use crate::error::{MonitorError, MonitorResult};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Alert thresholds and the global on/off switch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertSettings {
    pub enabled: bool,
    /// Alert when the DEX price is at or above this (USD)
    pub dex_price_upper: f64,
    /// Alert when the DEX price is at or below this (USD)
    pub dex_price_lower: f64,
    /// Alert when DEX is this many percent above the index
    pub divergence_upper: f64,
    /// Alert when DEX is this many percent below the index (negative)
    pub divergence_lower: f64,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            dex_price_upper: 0.60,
            dex_price_lower: 0.35,
            divergence_upper: 1.5,
            divergence_lower: -1.5,
        }
    }
}

/// Recognized setting keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    Enabled,
    DexPriceUpper,
    DexPriceLower,
    DivergenceUpper,
    DivergenceLower,
}

impl SettingKey {
    pub const ALL: [SettingKey; 5] = [
        SettingKey::Enabled,
        SettingKey::DexPriceUpper,
        SettingKey::DexPriceLower,
        SettingKey::DivergenceUpper,
        SettingKey::DivergenceLower,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SettingKey::Enabled => "enabled",
            SettingKey::DexPriceUpper => "dex_price_upper",
            SettingKey::DexPriceLower => "dex_price_lower",
            SettingKey::DivergenceUpper => "divergence_upper",
            SettingKey::DivergenceLower => "divergence_lower",
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingKey {
    type Err = MonitorError;

    /// Accepts snake_case and the camelCase spelling used by older configs
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "enabled" => Ok(SettingKey::Enabled),
            "dex_price_upper" | "dexPriceUpper" => Ok(SettingKey::DexPriceUpper),
            "dex_price_lower" | "dexPriceLower" => Ok(SettingKey::DexPriceLower),
            "divergence_upper" | "divergenceUpper" => Ok(SettingKey::DivergenceUpper),
            "divergence_lower" | "divergenceLower" => Ok(SettingKey::DivergenceLower),
            other => Err(MonitorError::UnknownKey(other.to_string())),
        }
    }
}

/// Value for a keyed update
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SettingValue {
    Flag(bool),
    Number(f64),
}

impl From<bool> for SettingValue {
    fn from(v: bool) -> Self {
        SettingValue::Flag(v)
    }
}

impl From<f64> for SettingValue {
    fn from(v: f64) -> Self {
        SettingValue::Number(v)
    }
}

impl AlertSettings {
    /// Keyed update. Fails without mutation on an unknown key or a value of
    /// the wrong kind.
    pub fn update(&mut self, key: &str, value: impl Into<SettingValue>) -> MonitorResult<()> {
        let key: SettingKey = key.parse()?;
        self.set(key, value.into())
    }

    /// Typed update for callers that already hold a `SettingKey`
    pub fn set(&mut self, key: SettingKey, value: SettingValue) -> MonitorResult<()> {
        match (key, value) {
            (SettingKey::Enabled, SettingValue::Flag(v)) => self.enabled = v,
            (SettingKey::DexPriceUpper, SettingValue::Number(v)) => self.dex_price_upper = v,
            (SettingKey::DexPriceLower, SettingValue::Number(v)) => self.dex_price_lower = v,
            (SettingKey::DivergenceUpper, SettingValue::Number(v)) => self.divergence_upper = v,
            (SettingKey::DivergenceLower, SettingValue::Number(v)) => self.divergence_lower = v,
            (key, value) => {
                return Err(MonitorError::InvalidValue {
                    key: key.to_string(),
                    message: format!("{:?} is the wrong kind of value", value),
                })
            }
        }
        Ok(())
    }

    pub fn get(&self, key: SettingKey) -> SettingValue {
        match key {
            SettingKey::Enabled => SettingValue::Flag(self.enabled),
            SettingKey::DexPriceUpper => SettingValue::Number(self.dex_price_upper),
            SettingKey::DexPriceLower => SettingValue::Number(self.dex_price_lower),
            SettingKey::DivergenceUpper => SettingValue::Number(self.divergence_upper),
            SettingKey::DivergenceLower => SettingValue::Number(self.divergence_lower),
        }
    }

    /// Load settings from a TOML file. Missing keys keep their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read alert settings: {}", path.as_ref().display()))?;

        let settings: Self = toml::from_str(&content)
            .with_context(|| "Failed to parse alert settings TOML")?;

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = AlertSettings::default();
        assert!(s.enabled);
        assert_eq!(s.dex_price_upper, 0.60);
        assert_eq!(s.dex_price_lower, 0.35);
        assert_eq!(s.divergence_upper, 1.5);
        assert_eq!(s.divergence_lower, -1.5);
    }

    #[test]
    fn test_update_known_keys() {
        let mut s = AlertSettings::default();
        s.update("enabled", false).unwrap();
        s.update("dex_price_upper", 0.55).unwrap();
        s.update("dexPriceLower", 0.30).unwrap();
        s.update("divergence_upper", 2.0).unwrap();
        s.update("divergenceLower", -2.5).unwrap();

        assert!(!s.enabled);
        assert_eq!(s.dex_price_upper, 0.55);
        assert_eq!(s.dex_price_lower, 0.30);
        assert_eq!(s.divergence_upper, 2.0);
        assert_eq!(s.divergence_lower, -2.5);
    }

    #[test]
    fn test_unknown_key_rejected_without_mutation() {
        let mut s = AlertSettings::default();
        let err = s.update("cooldown", 1.0).unwrap_err();
        assert!(matches!(err, MonitorError::UnknownKey(k) if k == "cooldown"));
        assert_eq!(s, AlertSettings::default());
    }

    #[test]
    fn test_wrong_value_kind_rejected() {
        let mut s = AlertSettings::default();
        assert!(s.update("enabled", 1.0).is_err());
        assert!(s.update("dex_price_upper", true).is_err());
        assert_eq!(s, AlertSettings::default());
    }

    #[test]
    fn test_inverted_range_accepted() {
        let mut s = AlertSettings::default();
        s.update("dex_price_lower", 0.90).unwrap();
        assert!(s.dex_price_lower > s.dex_price_upper);
    }

    #[test]
    fn test_get_matches_set() {
        let mut s = AlertSettings::default();
        for key in SettingKey::ALL {
            let value = s.get(key);
            s.set(key, value).unwrap();
        }
        assert_eq!(s, AlertSettings::default());
    }

    #[test]
    fn test_parse_toml_partial() {
        let toml_str = r#"
enabled = false
dex_price_upper = 0.75
"#;
        let s: AlertSettings = toml::from_str(toml_str).unwrap();
        assert!(!s.enabled);
        assert_eq!(s.dex_price_upper, 0.75);
        // Unspecified keys keep defaults
        assert_eq!(s.dex_price_lower, 0.35);
        assert_eq!(s.divergence_lower, -1.5);
    }
}
