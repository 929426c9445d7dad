//! Absenclaw configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AbsenError, Result};

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AbsenConfig {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,
    #[serde(default)]
    pub sheet: SheetConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
}

impl AbsenConfig {
    /// Load config from the default path (~/.absenclaw/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AbsenError::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| AbsenError::Config(format!("Failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Save config to the default path.
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| AbsenError::Config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the absenclaw home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".absenclaw")
    }
}

/// Telegram command-channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
    /// Chat id of the attendance counterpart bot.
    #[serde(default)]
    pub chat_id: i64,
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
    /// Health-probe cadence for the persistent session.
    #[serde(default = "default_probe_interval")]
    pub probe_interval_secs: u64,
}

fn default_http_timeout() -> u64 {
    10
}
fn default_probe_interval() -> u64 {
    60
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            chat_id: 0,
            timeout_secs: default_http_timeout(),
            probe_interval_secs: default_probe_interval(),
        }
    }
}

/// WhatsApp broadcast-channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatsAppConfig {
    /// Facebook Graph API access token
    #[serde(default)]
    pub access_token: String,
    /// WhatsApp Phone Number ID
    #[serde(default)]
    pub phone_number_id: String,
    /// Group/recipient the status text is posted to.
    #[serde(default)]
    pub group_id: String,
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
    /// Delay before re-initializing after a non-terminal close.
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_ms: u64,
}

fn default_reconnect_delay() -> u64 {
    5000
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            phone_number_id: String::new(),
            group_id: String::new(),
            timeout_secs: default_http_timeout(),
            reconnect_delay_ms: default_reconnect_delay(),
        }
    }
}

/// Sheet task-source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetConfig {
    /// Apps-Script style web API returning the attendance payload.
    #[serde(default)]
    pub api_url: String,
    #[serde(default = "default_sheet_timeout")]
    pub timeout_secs: u64,
    /// Ship WARN+ log lines to the sheet's postLog endpoint.
    #[serde(default)]
    pub forward_logs: bool,
}

fn default_sheet_timeout() -> u64 {
    15
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            timeout_secs: default_sheet_timeout(),
            forward_logs: false,
        }
    }
}

/// Trigger schedule. All expressions are evaluated in `timezone`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Fixed UTC offset of the workplace, e.g. "+07:00".
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Clock-in trigger — weekdays, one fixed time.
    #[serde(default = "default_clock_in")]
    pub clock_in: String,
    /// Clock-out triggers — normal day plus the early-release variant.
    /// Whichever fires first for a date wins; later firings no-op.
    #[serde(default = "default_clock_out")]
    pub clock_out: Vec<String>,
}

fn default_timezone() -> String {
    "+07:00".into()
}
fn default_clock_in() -> String {
    "50 7 * * 1-5".into()
}
fn default_clock_out() -> Vec<String> {
    vec!["0 17 * * 1-5".into(), "30 16 * * 5".into()]
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            clock_in: default_clock_in(),
            clock_out: default_clock_out(),
        }
    }
}

/// Dispatch-engine settings: command tokens and announcement pacing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    #[serde(default = "default_clock_in_token")]
    pub clock_in_token: String,
    #[serde(default = "default_clock_out_token")]
    pub clock_out_token: String,
    /// Prefix for per-entry timesheet announcements.
    #[serde(default = "default_announce_prefix")]
    pub announce_prefix: String,
    /// Inter-message delay between announcements (flood limit).
    #[serde(default = "default_announce_delay")]
    pub announce_delay_secs: u64,
}

fn default_clock_in_token() -> String {
    "/clock_in".into()
}
fn default_clock_out_token() -> String {
    "/clock_out".into()
}
fn default_announce_prefix() -> String {
    "/TS".into()
}
fn default_announce_delay() -> u64 {
    1
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            clock_in_token: default_clock_in_token(),
            clock_out_token: default_clock_out_token(),
            announce_prefix: default_announce_prefix(),
            announce_delay_secs: default_announce_delay(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AbsenConfig::default();
        assert_eq!(config.schedule.timezone, "+07:00");
        assert_eq!(config.schedule.clock_out.len(), 2);
        assert_eq!(config.dispatch.clock_in_token, "/clock_in");
        assert_eq!(config.dispatch.announce_delay_secs, 1);
    }

    #[test]
    fn test_config_from_toml() {
        let toml_str = r#"
            [telegram]
            bot_token = "123:abc"
            chat_id = 987654

            [schedule]
            timezone = "+08:00"
            clock_in = "0 8 * * 1-5"
            clock_out = ["0 18 * * 1-5"]
        "#;

        let config: AbsenConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.telegram.bot_token, "123:abc");
        assert_eq!(config.telegram.chat_id, 987654);
        assert_eq!(config.schedule.timezone, "+08:00");
        assert_eq!(config.schedule.clock_out, vec!["0 18 * * 1-5".to_string()]);
        // Untouched sections keep their defaults.
        assert_eq!(config.dispatch.announce_prefix, "/TS");
    }

    #[test]
    fn test_config_missing_fields_use_defaults() {
        let config: AbsenConfig = toml::from_str("").unwrap();
        assert_eq!(config.telegram.timeout_secs, 10);
        assert_eq!(config.whatsapp.reconnect_delay_ms, 5000);
        assert_eq!(config.sheet.timeout_secs, 15);
        assert!(!config.sheet.forward_logs);
    }

    #[test]
    fn test_home_dir() {
        let home = AbsenConfig::home_dir();
        assert!(home.to_string_lossy().contains("absenclaw"));
    }
}
