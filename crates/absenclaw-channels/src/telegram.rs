//! Telegram command channel — message sending via Bot API.
//!
//! The clock-in/clock-out tokens and timesheet announcements go to one
//! configured chat (the attendance counterpart bot). The session is
//! persistent in the sense that readiness is tracked and re-verified by the
//! health monitor; sends while not `Ready` fail fast without a network call.

use async_trait::async_trait;
use absenclaw_core::config::TelegramConfig;
use absenclaw_core::error::{AbsenError, Result};
use absenclaw_core::traits::CommandChannel;
use absenclaw_core::types::ConnectionState;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::RwLock;

/// Telegram command channel.
pub struct TelegramChannel {
    config: TelegramConfig,
    client: reqwest::Client,
    timeout: Duration,
    state: RwLock<ConnectionState>,
}

impl TelegramChannel {
    pub fn new(config: TelegramConfig) -> Self {
        let timeout = Duration::from_secs(config.timeout_secs);
        Self {
            config,
            client: reqwest::Client::new(),
            timeout,
            state: RwLock::new(ConnectionState::Disconnected),
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!(
            "https://api.telegram.org/bot{}/{}",
            self.config.bot_token, method
        )
    }

    /// Get bot info — doubles as the liveness probe.
    pub async fn get_me(&self) -> Result<TelegramUser> {
        let response = self
            .client
            .get(self.api_url("getMe"))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| http_err("getMe failed", e))?;
        let body: TelegramApiResponse<TelegramUser> = response
            .json()
            .await
            .map_err(|e| http_err("Invalid getMe response", e))?;
        if !body.ok {
            return Err(AbsenError::Channel(format!(
                "Telegram API error: {}",
                body.description.unwrap_or_default()
            )));
        }
        body.result
            .ok_or_else(|| AbsenError::Channel("No bot info".into()))
    }

    /// Send a text message to the configured chat.
    async fn send_message(&self, text: &str) -> Result<()> {
        let body = serde_json::json!({
            "chat_id": self.config.chat_id,
            "text": text,
        });

        let response = self
            .client
            .post(self.api_url("sendMessage"))
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| http_err("sendMessage failed", e))?;

        let result: TelegramApiResponse<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| http_err("Invalid send response", e))?;

        if !result.ok {
            return Err(AbsenError::Channel(format!(
                "Send failed: {}",
                result.description.unwrap_or_default()
            )));
        }
        Ok(())
    }

    async fn set_state(&self, state: ConnectionState) {
        *self.state.write().await = state;
    }
}

fn http_err(context: &str, e: reqwest::Error) -> AbsenError {
    if e.is_timeout() {
        AbsenError::Timeout(format!("{context}: {e}"))
    } else {
        AbsenError::Channel(format!("{context}: {e}"))
    }
}

#[async_trait]
impl CommandChannel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn connect(&self) -> Result<()> {
        self.set_state(ConnectionState::Connecting).await;
        match self.get_me().await {
            Ok(me) => {
                tracing::info!(
                    "Telegram bot: @{} ({})",
                    me.username.as_deref().unwrap_or("unknown"),
                    me.first_name
                );
                self.set_state(ConnectionState::Ready).await;
                Ok(())
            }
            Err(e) => {
                self.set_state(ConnectionState::Disconnected).await;
                Err(e)
            }
        }
    }

    async fn disconnect(&self) {
        self.set_state(ConnectionState::Disconnected).await;
    }

    async fn state(&self) -> ConnectionState {
        *self.state.read().await
    }

    async fn send(&self, text: &str) -> Result<()> {
        if !self.is_ready().await {
            return Err(AbsenError::Channel(
                "Telegram not ready — send skipped".into(),
            ));
        }
        self.send_message(text).await?;
        tracing::debug!("Telegram sent: {text}");
        Ok(())
    }

    async fn probe(&self) -> Result<()> {
        self.get_me().await.map(|_| ())
    }
}

// --- Telegram API Types ---

#[derive(Debug, Deserialize)]
pub struct TelegramApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    pub is_bot: bool,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel() -> TelegramChannel {
        TelegramChannel::new(TelegramConfig {
            bot_token: "123:abc".into(),
            chat_id: 42,
            ..Default::default()
        })
    }

    #[test]
    fn test_api_url() {
        let ch = channel();
        assert_eq!(
            ch.api_url("sendMessage"),
            "https://api.telegram.org/bot123:abc/sendMessage"
        );
    }

    #[tokio::test]
    async fn test_send_fails_fast_when_not_ready() {
        let ch = channel();
        assert_eq!(ch.state().await, ConnectionState::Disconnected);
        let err = ch.send("/clock_in").await.unwrap_err();
        assert!(matches!(err, AbsenError::Channel(_)));
    }

    #[tokio::test]
    async fn test_disconnect_drops_readiness() {
        let ch = channel();
        ch.set_state(ConnectionState::Ready).await;
        assert!(ch.is_ready().await);
        ch.disconnect().await;
        assert!(!ch.is_ready().await);
    }
}
