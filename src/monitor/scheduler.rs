//! Tick Scheduler
//!
//! Drives the two monitor activities on fixed intervals. Every tick is
//! spawned as its own task; a per-activity `TickGuard` makes a tick that
//! finds the previous one still running skip instead of overlapping.
//!
//! Ctrl-C stops both activities. SIGHUP reloads the alert settings file.

use super::Monitor;
use crate::alerts::AlertSettings;
use anyhow::{Context, Result};
use futures::StreamExt;
use signal_hook::consts::SIGHUP;
use signal_hook_tokio::Signals;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

/// Skip-if-running flag for one periodic activity
#[derive(Debug, Default)]
pub struct TickGuard {
    running: AtomicBool,
}

/// Held for the duration of one tick; releases the guard on drop
#[derive(Debug)]
pub struct TickPermit<'a> {
    guard: &'a TickGuard,
}

impl TickGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// None if a tick of this activity is already in flight
    pub fn try_enter(&self) -> Option<TickPermit<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| TickPermit { guard: self })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

impl Drop for TickPermit<'_> {
    fn drop(&mut self) {
        self.guard.running.store(false, Ordering::Release);
    }
}

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub poll_interval: Duration,
    pub command_interval: Duration,
    /// TOML file re-read on SIGHUP
    pub settings_file: Option<PathBuf>,
}

/// Spawn a task that fires `tick` every `period`. Each tick runs detached so
/// a slow tick never delays the interval.
fn spawn_periodic<F, Fut>(name: &'static str, period: Duration, tick: F) -> JoinHandle<()>
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!("{} activity every {:?}", name, period);
        loop {
            interval.tick().await;
            tokio::spawn(tick());
        }
    })
}

/// Reload thresholds from `path` and apply them to the running monitor
async fn reload_settings(monitor: &Monitor, path: &Path) {
    match AlertSettings::load(path) {
        Ok(settings) => {
            monitor.apply_settings(settings).await;
            info!("Alert settings reloaded from {}", path.display());
        }
        Err(e) => error!("Settings reload failed, keeping current values: {:#}", e),
    }
}

/// Run both activities until Ctrl-C
pub async fn run(monitor: Arc<Monitor>, config: SchedulerConfig) -> Result<()> {
    let poll_monitor = Arc::clone(&monitor);
    let poll_task = spawn_periodic("Poll", config.poll_interval, move || {
        let monitor = Arc::clone(&poll_monitor);
        async move {
            monitor.on_poll_tick().await;
        }
    });

    let command_monitor = Arc::clone(&monitor);
    let command_task = spawn_periodic("Command", config.command_interval, move || {
        let monitor = Arc::clone(&command_monitor);
        async move {
            monitor.on_command_tick().await;
        }
    });

    // SIGHUP -> reload settings file
    let signals = Signals::new([SIGHUP]).context("Failed to register SIGHUP handler")?;
    let signals_handle = signals.handle();
    let reload_monitor = Arc::clone(&monitor);
    let settings_file = config.settings_file.clone();
    let signal_task = tokio::spawn(async move {
        let mut signals = signals;
        while let Some(sig) = signals.next().await {
            if sig != SIGHUP {
                continue;
            }
            info!("Received SIGHUP");
            match &settings_file {
                Some(path) => reload_settings(&reload_monitor, path).await,
                None => warn!("SIGHUP ignored: ALERT_SETTINGS_FILE not set"),
            }
        }
    });

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    info!("Shutdown requested");

    signals_handle.close();
    poll_task.abort();
    command_task.abort();
    signal_task.abort();
    Ok(())
}
