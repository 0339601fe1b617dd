//! Messaging
//!
//! Outbound alert delivery (`MessageSink`) and inbound operator commands
//! (`CommandSource`). The Telegram Bot API implements both; `LogSink` stands
//! in for delivery in dry-run mode.
//!
//! Created: 2026-10-19

pub mod telegram;

pub use telegram::TelegramClient;

use crate::error::MonitorResult;
use async_trait::async_trait;
use tracing::info;

/// One inbound update from the command channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandUpdate {
    /// Monotonic id assigned by the channel
    pub update_id: i64,
    /// None for updates from other chats and non-text updates. They still
    /// advance the cursor.
    pub text: Option<String>,
}

#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn deliver(&self, text: &str) -> MonitorResult<()>;
}

#[async_trait]
pub trait CommandSource: Send + Sync {
    /// Updates with an id greater than `since` (all pending when None)
    async fn receive(&self, since: Option<i64>) -> MonitorResult<Vec<CommandUpdate>>;
}

/// Sink that writes messages to the log instead of sending them
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

#[async_trait]
impl MessageSink for LogSink {
    async fn deliver(&self, text: &str) -> MonitorResult<()> {
        info!("[dry-run] message:\n{}", text);
        Ok(())
    }
}
