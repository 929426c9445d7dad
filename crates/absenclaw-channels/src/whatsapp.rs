//! WhatsApp broadcast channel — Business Cloud API.
//!
//! Readiness is event-driven: the channel emits `BroadcastEvent`s on an
//! mpsc stream that the supervisor observes passively. A terminal auth loss
//! (`logged_out: true`) suppresses automatic reconnection; any other close
//! is retried by the supervisor after a delay.

use async_trait::async_trait;
use absenclaw_core::config::WhatsAppConfig;
use absenclaw_core::error::{AbsenError, Result};
use absenclaw_core::traits::BroadcastChannel;
use absenclaw_core::types::{BroadcastEvent, ConnectionState};
use std::time::Duration;
use tokio::sync::{RwLock, mpsc};

const GRAPH_BASE: &str = "https://graph.facebook.com/v21.0";

/// WhatsApp broadcast channel implementation.
pub struct WhatsAppChannel {
    config: WhatsAppConfig,
    client: reqwest::Client,
    timeout: Duration,
    state: RwLock<ConnectionState>,
    events: mpsc::UnboundedSender<BroadcastEvent>,
}

impl WhatsAppChannel {
    /// Build the channel plus the event stream its supervisor drains.
    pub fn new(config: WhatsAppConfig) -> (Self, mpsc::UnboundedReceiver<BroadcastEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let timeout = Duration::from_secs(config.timeout_secs);
        let channel = Self {
            config,
            client: reqwest::Client::new(),
            timeout,
            state: RwLock::new(ConnectionState::Disconnected),
            events: tx,
        };
        (channel, rx)
    }

    fn emit(&self, event: BroadcastEvent) {
        // Receiver gone means nobody supervises anymore; drop silently.
        let _ = self.events.send(event);
    }

    async fn set_state(&self, state: ConnectionState) {
        *self.state.write().await = state;
    }

    /// Send a text message via the Cloud API.
    async fn send_text_message(&self, to: &str, text: &str) -> Result<()> {
        let url = format!("{}/{}/messages", GRAPH_BASE, self.config.phone_number_id);

        let body = serde_json::json!({
            "messaging_product": "whatsapp",
            "to": to,
            "type": "text",
            "text": {
                "preview_url": false,
                "body": text
            }
        });

        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.config.access_token),
            )
            .header("Content-Type", "application/json")
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AbsenError::Timeout(format!("WhatsApp API request timed out: {e}"))
                } else {
                    AbsenError::Channel(format!("WhatsApp API request failed: {e}"))
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            // Token revoked mid-session — surface as a terminal close.
            self.set_state(ConnectionState::Disconnected).await;
            self.emit(BroadcastEvent::Closed {
                reason: format!("auth rejected on send ({status})"),
                logged_out: true,
            });
            return Err(AbsenError::AuthFailed(format!(
                "WhatsApp rejected token: {status}"
            )));
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AbsenError::Channel(format!(
                "WhatsApp API error {status}: {error_text}"
            )));
        }

        tracing::debug!("WhatsApp message sent → {to}");
        Ok(())
    }
}

#[async_trait]
impl BroadcastChannel for WhatsAppChannel {
    fn name(&self) -> &str {
        "whatsapp"
    }

    async fn initialize(&self) -> Result<()> {
        if self.config.access_token.is_empty() || self.config.phone_number_id.is_empty() {
            self.emit(BroadcastEvent::NeedsPairing);
            return Err(AbsenError::Config(
                "WhatsApp access_token/phone_number_id not configured".into(),
            ));
        }

        self.set_state(ConnectionState::Connecting).await;

        // Verify the token by reading the phone-number object.
        let url = format!("{}/{}", GRAPH_BASE, self.config.phone_number_id);
        let response = self
            .client
            .get(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.config.access_token),
            )
            .timeout(self.timeout)
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => {
                self.set_state(ConnectionState::Ready).await;
                self.emit(BroadcastEvent::Open);
                tracing::info!(
                    "WhatsApp: connected (phone_id={})",
                    self.config.phone_number_id
                );
                Ok(())
            }
            Ok(resp)
                if resp.status() == reqwest::StatusCode::UNAUTHORIZED
                    || resp.status() == reqwest::StatusCode::FORBIDDEN =>
            {
                let text = resp.text().await.unwrap_or_default();
                self.set_state(ConnectionState::Disconnected).await;
                self.emit(BroadcastEvent::Closed {
                    reason: "token verification rejected".into(),
                    logged_out: true,
                });
                Err(AbsenError::AuthFailed(format!(
                    "WhatsApp token verification failed: {text}"
                )))
            }
            Ok(resp) => {
                let status = resp.status();
                self.set_state(ConnectionState::Disconnected).await;
                self.emit(BroadcastEvent::Closed {
                    reason: format!("verification error {status}"),
                    logged_out: false,
                });
                Err(AbsenError::Channel(format!(
                    "WhatsApp verification error: {status}"
                )))
            }
            Err(e) => {
                self.set_state(ConnectionState::Disconnected).await;
                self.emit(BroadcastEvent::Closed {
                    reason: e.to_string(),
                    logged_out: false,
                });
                if e.is_timeout() {
                    Err(AbsenError::Timeout(format!(
                        "WhatsApp verification timed out: {e}"
                    )))
                } else {
                    Err(AbsenError::Channel(format!(
                        "WhatsApp verification failed: {e}"
                    )))
                }
            }
        }
    }

    async fn state(&self) -> ConnectionState {
        *self.state.read().await
    }

    async fn send(&self, group_id: &str, text: &str) -> Result<()> {
        if *self.state.read().await != ConnectionState::Ready {
            return Err(AbsenError::Channel(
                "WhatsApp not open — send skipped".into(),
            ));
        }
        self.send_text_message(group_id, text).await
    }

    async fn close(&self) {
        self.set_state(ConnectionState::Disconnected).await;
        tracing::info!("WhatsApp: disconnected");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_initialize_without_credentials_needs_pairing() {
        let (ch, mut events) = WhatsAppChannel::new(WhatsAppConfig::default());
        let err = ch.initialize().await.unwrap_err();
        assert!(matches!(err, AbsenError::Config(_)));
        assert!(matches!(
            events.try_recv(),
            Ok(BroadcastEvent::NeedsPairing)
        ));
        assert_eq!(ch.state().await, ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_send_fails_fast_when_not_open() {
        let (ch, _events) = WhatsAppChannel::new(WhatsAppConfig {
            access_token: "token".into(),
            phone_number_id: "123".into(),
            ..Default::default()
        });
        let err = ch.send("group-1", "hello").await.unwrap_err();
        assert!(matches!(err, AbsenError::Channel(_)));
    }
}
