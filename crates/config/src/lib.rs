//! Configuration loading, validation, and management for FemtoClaw.
//!
//! The whole device configuration is one [`Config`] record plus the two
//! polling [`Cursors`]. Both are persisted together through a
//! [`ConfigStore`] on every mutation; the default store writes
//! `~/.femtoclaw/config.toml`.

mod store;

pub use store::{ConfigStore, MemoryStore, TomlFileStore};

use femtoclaw_core::bounded::{Identifier, Text};
use femtoclaw_core::limits::{ALLOW_LIST_MAX, CFG_CAP};
use femtoclaw_core::provider::LlmSettings;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// The root configuration structure.
///
/// Maps directly to `~/.femtoclaw/config.toml`.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub wifi: WifiConfig,

    #[serde(default)]
    pub llm: LlmSettings,

    #[serde(default)]
    pub agent: AgentSettings,

    #[serde(default)]
    pub telegram: ChannelConfig,

    #[serde(default)]
    pub discord: ChannelConfig,
}

#[derive(Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WifiConfig {
    #[serde(default)]
    pub ssid: Text<CFG_CAP>,

    #[serde(default)]
    pub pass: Text<CFG_CAP>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentSettings {
    /// Model calls per inbound message, tool round trips included
    #[serde(default = "default_max_tool_iters")]
    pub max_tool_iters: u8,

    /// Self-report period; 0 disables the heartbeat
    #[serde(default)]
    pub heartbeat_ms: u32,
}

fn default_max_tool_iters() -> u8 {
    3
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_tool_iters: default_max_tool_iters(),
            heartbeat_ms: 0,
        }
    }
}

/// One chat channel: switch, bot credential, sender allow-list.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChannelConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub token: Text<CFG_CAP>,

    /// Senders allowed to reach the agent. Empty = everyone.
    #[serde(default)]
    pub allow_from: AllowList,

    /// Channel to watch (Discord only)
    #[serde(default, skip_serializing_if = "Identifier::is_empty")]
    pub channel_id: Identifier,
}

/// Bounded list of sender IDs. Entries are never empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct AllowList {
    entries: heapless::Vec<Identifier, ALLOW_LIST_MAX>,
}

impl AllowList {
    pub fn add(&mut self, id: &str) -> Result<(), ConfigError> {
        if id.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "allow".into(),
                reason: "empty id".into(),
            });
        }
        let id = Identifier::parse(id).map_err(|e| ConfigError::InvalidValue {
            key: "allow".into(),
            reason: e.to_string(),
        })?;
        self.entries
            .push(id)
            .map_err(|_| ConfigError::AllowListFull(ALLOW_LIST_MAX))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Identifier> {
        self.entries.iter()
    }

    /// Exact match against a non-empty id.
    pub fn contains(&self, id: &Identifier) -> bool {
        !id.is_empty() && self.entries.iter().any(|e| e == id)
    }
}

/// Per-channel positions in the remote message streams.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Cursors {
    /// Next Telegram `update_id` to request
    #[serde(default, rename = "tg_offset")]
    pub telegram_offset: i64,

    /// Newest Discord message seen; empty until the first poll
    #[serde(default, rename = "dc_last_id")]
    pub discord_last_id: Identifier,
}

fn redact(s: &str) -> &'static str {
    if s.is_empty() { "(none)" } else { "[REDACTED]" }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("wifi", &self.wifi)
            .field("llm", &self.llm)
            .field("agent", &self.agent)
            .field("telegram", &self.telegram)
            .field("discord", &self.discord)
            .finish()
    }
}

impl fmt::Debug for WifiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WifiConfig")
            .field("ssid", &self.ssid)
            .field("pass", &redact(&self.pass))
            .finish()
    }
}

impl fmt::Debug for ChannelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelConfig")
            .field("enabled", &self.enabled)
            .field("token", &redact(&self.token))
            .field("allow_from", &self.allow_from.len())
            .field("channel_id", &self.channel_id)
            .finish()
    }
}

impl Config {
    /// Keys accepted by [`Config::set`].
    pub const KEYS: &'static [&'static str] = &[
        "wifi_ssid",
        "wifi_pass",
        "llm_provider",
        "llm_api_key",
        "llm_api_base",
        "llm_model",
        "max_tokens",
        "temperature",
        "max_tool_iters",
        "heartbeat_ms",
        "system_prompt",
        "tg_token",
        "dc_token",
        "dc_channel_id",
    ];

    /// Updates one field by its persisted key name.
    ///
    /// Setting a bot token also enables its channel. Values that do not fit
    /// or do not parse are rejected and leave the field unchanged.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "wifi_ssid" => assign(&mut self.wifi.ssid, key, value),
            "wifi_pass" => assign(&mut self.wifi.pass, key, value),
            "llm_provider" => assign(&mut self.llm.provider, key, value),
            "llm_api_key" => assign(&mut self.llm.api_key, key, value),
            "llm_api_base" => assign(&mut self.llm.api_base, key, value),
            "llm_model" => assign(&mut self.llm.model, key, value),
            "system_prompt" => assign(&mut self.llm.system_prompt, key, value),
            "max_tokens" => {
                self.llm.max_tokens = parse_number(key, value)?;
                Ok(())
            }
            "temperature" => {
                let t: f32 = parse_number(key, value)?;
                if !(0.0..=2.0).contains(&t) {
                    return Err(ConfigError::InvalidValue {
                        key: key.into(),
                        reason: "must be between 0.0 and 2.0".into(),
                    });
                }
                self.llm.temperature = t;
                Ok(())
            }
            "max_tool_iters" => {
                self.agent.max_tool_iters = parse_number(key, value)?;
                Ok(())
            }
            "heartbeat_ms" => {
                self.agent.heartbeat_ms = parse_number(key, value)?;
                Ok(())
            }
            "tg_token" => {
                assign(&mut self.telegram.token, key, value)?;
                self.telegram.enabled = true;
                Ok(())
            }
            "dc_token" => {
                assign(&mut self.discord.token, key, value)?;
                self.discord.enabled = true;
                Ok(())
            }
            "dc_channel_id" => {
                let id = Identifier::parse(value).map_err(|_| ConfigError::ValueTooLong {
                    key: key.into(),
                    max: Identifier::max_len(),
                })?;
                self.discord.channel_id = id;
                Ok(())
            }
            other => Err(ConfigError::UnknownKey(other.into())),
        }
    }

    /// Environment variable overrides (highest priority):
    /// - `FEMTOCLAW_API_KEY`, then `OPENROUTER_API_KEY`
    /// - `FEMTOCLAW_API_BASE`, `FEMTOCLAW_MODEL`
    /// - `FEMTOCLAW_TELEGRAM_TOKEN`, `FEMTOCLAW_DISCORD_TOKEN`
    pub fn apply_env_overrides(&mut self) {
        let api_key = std::env::var("FEMTOCLAW_API_KEY")
            .ok()
            .or_else(|| std::env::var("OPENROUTER_API_KEY").ok());
        let overrides = [
            ("llm_api_key", api_key),
            ("llm_api_base", std::env::var("FEMTOCLAW_API_BASE").ok()),
            ("llm_model", std::env::var("FEMTOCLAW_MODEL").ok()),
            ("tg_token", std::env::var("FEMTOCLAW_TELEGRAM_TOKEN").ok()),
            ("dc_token", std::env::var("FEMTOCLAW_DISCORD_TOKEN").ok()),
        ];
        for (key, value) in overrides {
            if let Some(value) = value {
                if let Err(e) = self.set(key, &value) {
                    tracing::warn!(key, error = %e, "Ignoring environment override");
                }
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if self.llm.max_tokens == 0 {
            return Err(ConfigError::ValidationError("max_tokens must be > 0".into()));
        }
        if self.telegram.enabled && self.telegram.token.is_empty() {
            return Err(ConfigError::ValidationError(
                "telegram is enabled but has no token".into(),
            ));
        }
        if self.discord.enabled && (self.discord.token.is_empty() || self.discord.channel_id.is_empty()) {
            return Err(ConfigError::ValidationError(
                "discord is enabled but needs both a token and a channel id".into(),
            ));
        }
        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".femtoclaw")
    }

    /// Default location of the persisted configuration.
    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

fn assign<const N: usize>(field: &mut Text<N>, key: &str, value: &str) -> Result<(), ConfigError> {
    *field = Text::try_from(value).map_err(|_| ConfigError::ValueTooLong {
        key: key.into(),
        max: N,
    })?;
    Ok(())
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T::Err: fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.into(),
        reason: e.to_string(),
    })
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Failed to write config file at {path}: {reason}")]
    WriteError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    #[error("unknown key '{0}'")]
    UnknownKey(String),

    #[error("value for '{key}' is longer than {max} bytes")]
    ValueTooLong { key: String, max: usize },

    #[error("invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("allow list is full ({0} entries)")]
    AllowListFull(usize),
}
