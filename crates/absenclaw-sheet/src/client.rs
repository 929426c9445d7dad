//! Sheet web-API client.
//!
//! One read operation (today's attendance payload) and one optional
//! write (log forwarding). The read maps failures to `AbsenError::Sheet`;
//! the write swallows failures entirely — losing a remote log line must
//! never disturb the dispatch path.

use async_trait::async_trait;
use absenclaw_core::config::SheetConfig;
use absenclaw_core::error::{AbsenError, Result};
use absenclaw_core::traits::TaskSource;
use absenclaw_core::types::AttendancePayload;
use std::time::Duration;

/// Client for the Apps-Script style sheet endpoint.
pub struct SheetClient {
    api_url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl SheetClient {
    pub fn new(config: &SheetConfig) -> Self {
        Self {
            api_url: config.api_url.clone(),
            client: reqwest::Client::new(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Fetch today's check-in/check-out messages and timesheet entries.
    pub async fn fetch_payload(&self) -> Result<AttendancePayload> {
        if self.api_url.is_empty() {
            return Err(AbsenError::Config("sheet api_url not configured".into()));
        }

        let response = self
            .client
            .get(&self.api_url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AbsenError::Timeout(format!("Sheet fetch timed out: {e}"))
                } else {
                    AbsenError::Sheet(format!("Sheet fetch failed: {e}"))
                }
            })?;

        if !response.status().is_success() {
            return Err(AbsenError::Sheet(format!(
                "Sheet API error: {}",
                response.status()
            )));
        }

        let payload: AttendancePayload = response
            .json()
            .await
            .map_err(|e| AbsenError::Sheet(format!("Invalid sheet payload: {e}")))?;

        tracing::debug!(
            "Sheet payload: check_in={} check_out={} entries={}",
            payload.check_in_message.is_some(),
            payload.check_out_message.is_some(),
            payload.entries.len()
        );
        Ok(payload)
    }

    /// Forward one log line to the sheet. Failures are swallowed after a
    /// debug line; this call must never matter to the caller.
    pub async fn post_log(&self, level: &str, message: &str) {
        if self.api_url.is_empty() {
            return;
        }

        let body = serde_json::json!({
            "type": "log",
            "level": level,
            "message": message,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });

        match self
            .client
            .post(&self.api_url)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => {}
            Ok(resp) => tracing::debug!("postLog rejected: {}", resp.status()),
            Err(e) => tracing::debug!("postLog failed: {e}"),
        }
    }
}

#[async_trait]
impl TaskSource for SheetClient {
    async fn fetch(&self) -> Result<AttendancePayload> {
        self.fetch_payload().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_without_url_is_config_error() {
        let client = SheetClient::new(&SheetConfig::default());
        let err = client.fetch_payload().await.unwrap_err();
        assert!(matches!(err, AbsenError::Config(_)));
    }

    #[tokio::test]
    async fn test_post_log_without_url_is_silent() {
        let client = SheetClient::new(&SheetConfig::default());
        // Must not panic or block.
        client.post_log("warn", "nothing to see").await;
    }
}
