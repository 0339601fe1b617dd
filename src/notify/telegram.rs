//! Telegram Bot API client
//!
//! `sendMessage` with HTML parse mode for delivery, short-polled
//! `getUpdates` for operator commands. Only text messages from the
//! configured chat are passed on; everything else comes back with
//! `text: None` so the caller's cursor still moves past it.

use super::{CommandSource, CommandUpdate, MessageSink};
use crate::error::{MonitorError, MonitorResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Long-poll timeout passed to getUpdates (seconds)
const GET_UPDATES_TIMEOUT_SECS: u64 = 1;

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
}

/// Envelope of every Bot API response
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    message: Option<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    chat: Chat,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: i64,
}

pub struct TelegramClient {
    client: reqwest::Client,
    api_url: String,
    token: String,
    chat_id: String,
}

impl TelegramClient {
    pub fn new(
        api_url: impl Into<String>,
        token: impl Into<String>,
        chat_id: impl Into<String>,
        timeout: Duration,
    ) -> MonitorResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MonitorError::fetch("telegram", e))?;

        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            chat_id: chat_id.into(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.token, method)
    }

    /// Map raw updates to command updates, blanking anything not from our chat
    fn filter_updates(&self, updates: Vec<Update>) -> Vec<CommandUpdate> {
        updates
            .into_iter()
            .map(|update| {
                let text = update.message.and_then(|m| {
                    if m.chat.id.to_string() == self.chat_id {
                        m.text
                    } else {
                        debug!("Ignoring update {} from chat {}", update.update_id, m.chat.id);
                        None
                    }
                });
                CommandUpdate {
                    update_id: update.update_id,
                    text,
                }
            })
            .collect()
    }
}

/// Redact the bot token from error text (reqwest errors include the URL)
fn redact(message: String, token: &str) -> String {
    if token.is_empty() {
        message
    } else {
        message.replace(token, "<token>")
    }
}

#[async_trait]
impl MessageSink for TelegramClient {
    async fn deliver(&self, text: &str) -> MonitorResult<()> {
        let body = SendMessage {
            chat_id: &self.chat_id,
            text,
            parse_mode: "HTML",
        };

        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&body)
            .send()
            .await
            .map_err(|e| MonitorError::Delivery(redact(e.to_string(), &self.token)))?;

        let status = response.status();
        let api: ApiResponse<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| MonitorError::Delivery(redact(e.to_string(), &self.token)))?;

        if !status.is_success() || !api.ok {
            return Err(MonitorError::Delivery(format!(
                "HTTP {}: {}",
                status,
                api.description.unwrap_or_default()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl CommandSource for TelegramClient {
    async fn receive(&self, since: Option<i64>) -> MonitorResult<Vec<CommandUpdate>> {
        let mut url = format!(
            "{}?timeout={}",
            self.method_url("getUpdates"),
            GET_UPDATES_TIMEOUT_SECS
        );
        if let Some(cursor) = since {
            url.push_str(&format!("&offset={}", cursor + 1));
        }

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| MonitorError::fetch("telegram", redact(e.to_string(), &self.token)))?;

        let api: ApiResponse<Vec<Update>> = response
            .json()
            .await
            .map_err(|e| MonitorError::fetch("telegram", redact(e.to_string(), &self.token)))?;

        if !api.ok {
            return Err(MonitorError::fetch(
                "telegram",
                api.description.unwrap_or_else(|| "getUpdates returned ok=false".to_string()),
            ));
        }

        Ok(self.filter_updates(api.result.unwrap_or_default()))
    }
}
