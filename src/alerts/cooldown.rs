//! Alert Cooldown: suppress repeats of the same alert kind
//!
//! Each `AlertKind` has its own last-fired timestamp. A kind may fire again
//! only once strictly more than `cooldown` has elapsed since it last fired;
//! a check landing exactly on the boundary does not fire. Kinds never
//! interfere with each other.
//!
//! Not synchronized. The monitor keeps the ledger behind its state mutex.

use crate::types::AlertKind;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tracing::debug;

/// Default alert cooldown: 5 minutes
pub const DEFAULT_ALERT_COOLDOWN_MS: i64 = 300_000;

/// Per-kind last-fired ledger
#[derive(Debug, Clone)]
pub struct CooldownLedger {
    /// Absent = never fired
    last_fired: HashMap<AlertKind, DateTime<Utc>>,
    cooldown: Duration,
}

impl CooldownLedger {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            last_fired: HashMap::new(),
            cooldown,
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn last_fired(&self, kind: AlertKind) -> Option<DateTime<Utc>> {
        self.last_fired.get(&kind).copied()
    }

    /// Returns true and records `now` if `kind` may fire; false otherwise.
    pub fn try_fire(&mut self, kind: AlertKind, now: DateTime<Utc>) -> bool {
        if let Some(last) = self.last_fired.get(&kind) {
            let elapsed = now.signed_duration_since(*last);
            if elapsed <= self.cooldown {
                debug!(
                    "Alert {} suppressed: {}ms since last, cooldown {}ms",
                    kind,
                    elapsed.num_milliseconds(),
                    self.cooldown.num_milliseconds()
                );
                return false;
            }
        }
        self.last_fired.insert(kind, now);
        true
    }

    /// Time until `kind` can fire again (None = can fire now)
    pub fn remaining(&self, kind: AlertKind, now: DateTime<Utc>) -> Option<Duration> {
        let last = self.last_fired.get(&kind)?;
        let elapsed = now.signed_duration_since(*last);
        if elapsed > self.cooldown {
            None
        } else {
            Some(self.cooldown - elapsed)
        }
    }
}

impl Default for CooldownLedger {
    fn default() -> Self {
        Self::new(Duration::milliseconds(DEFAULT_ALERT_COOLDOWN_MS))
    }
}
