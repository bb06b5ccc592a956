//! Persistence of the config record and polling cursors.

use crate::{Config, ConfigError, Cursors};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// Load/save capability for the device state that survives restarts.
///
/// Every field of [`Config`] and [`Cursors`] must round-trip exactly.
pub trait ConfigStore: Send {
    fn load(&self) -> Result<(Config, Cursors), ConfigError>;

    fn save(&mut self, config: &Config, cursors: &Cursors) -> Result<(), ConfigError>;
}

/// On-disk layout: the config tables plus a `[cursors]` table.
#[derive(Serialize, Deserialize)]
struct Document {
    #[serde(flatten)]
    config: Config,

    #[serde(default)]
    cursors: Cursors,
}

/// TOML file store.
pub struct TomlFileStore {
    path: PathBuf,
}

impl TomlFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_err(&self, reason: impl ToString) -> ConfigError {
        ConfigError::WriteError {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }
}

impl ConfigStore for TomlFileStore {
    /// A missing file yields defaults; a present but invalid file is an error.
    fn load(&self) -> Result<(Config, Cursors), ConfigError> {
        if !self.path.exists() {
            tracing::info!("No config file found at {}, using defaults", self.path.display());
            return Ok((Config::default(), Cursors::default()));
        }

        let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::ReadError {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;

        let doc: Document = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;

        Ok((doc.config, doc.cursors))
    }

    /// Writes to a sibling temp file first, then renames over the target.
    fn save(&mut self, config: &Config, cursors: &Cursors) -> Result<(), ConfigError> {
        let doc = Document {
            config: config.clone(),
            cursors: cursors.clone(),
        };
        let text = toml::to_string_pretty(&doc).map_err(|e| self.write_err(e))?;

        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| self.write_err(e))?;
        }
        let tmp = self.path.with_extension("toml.tmp");
        std::fs::write(&tmp, text).map_err(|e| self.write_err(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.write_err(e))?;

        tracing::debug!(path = %self.path.display(), "Config saved");
        Ok(())
    }
}

/// In-memory store. Clones share the same slot, so a test can keep one
/// handle while the runtime owns another.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemorySlot>>,
}

#[derive(Default)]
struct MemorySlot {
    saved: Option<(Config, Cursors)>,
    saves: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `config` and `cursors`.
    pub fn with(config: Config, cursors: Cursors) -> Self {
        let store = Self::new();
        store.slot().saved = Some((config, cursors));
        store
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, MemorySlot> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of successful saves.
    pub fn saves(&self) -> usize {
        self.slot().saves
    }

    /// The last saved state.
    pub fn snapshot(&self) -> Option<(Config, Cursors)> {
        self.slot().saved.clone()
    }
}

impl ConfigStore for MemoryStore {
    fn load(&self) -> Result<(Config, Cursors), ConfigError> {
        Ok(self.slot().saved.clone().unwrap_or_default())
    }

    fn save(&mut self, config: &Config, cursors: &Cursors) -> Result<(), ConfigError> {
        let mut slot = self.slot();
        slot.saved = Some((config.clone(), cursors.clone()));
        slot.saves += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use femtoclaw_core::bounded::Identifier;

    #[test]
    fn missing_config_file_returns_defaults() {
        let store = TomlFileStore::new("/nonexistent/femtoclaw/config.toml");
        let (config, cursors) = store.load().unwrap();
        assert!(config == Config::default());
        assert_eq!(cursors, Cursors::default());
    }

    #[test]
    fn file_store_round_trips_every_field() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = TomlFileStore::new(dir.path().join("nested").join("config.toml"));

        let mut config = Config::default();
        for (key, value) in [
            ("wifi_ssid", "lab"),
            ("wifi_pass", "pa\"ss"),
            ("llm_provider", "ollama"),
            ("llm_api_key", "sk-1"),
            ("llm_api_base", "http://192.168.1.10:11434/v1"),
            ("llm_model", "qwen2.5:0.5b"),
            ("max_tokens", "256"),
            ("temperature", "0.35"),
            ("max_tool_iters", "5"),
            ("heartbeat_ms", "60000"),
            ("tg_token", "123:abc"),
            ("dc_token", "dc-token"),
            ("dc_channel_id", "1234567890123456789"),
        ] {
            config.set(key, value).unwrap();
        }
        config.telegram.allow_from.add("111").unwrap();
        config.discord.allow_from.add("222").unwrap();
        config.discord.allow_from.add("333").unwrap();
        let cursors = Cursors {
            telegram_offset: 987_654_321,
            discord_last_id: Identifier::parse("1234567890123456790").unwrap(),
        };

        store.save(&config, &cursors).unwrap();
        let (loaded, loaded_cursors) = store.load().unwrap();
        assert!(loaded == config);
        assert_eq!(loaded_cursors, cursors);

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("tg_offset"));
        assert!(raw.contains("dc_last_id"));
    }

    #[test]
    fn oversized_persisted_value_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, format!("[llm]\nmodel = \"{}\"\n", "m".repeat(80))).unwrap();
        let err = TomlFileStore::new(&path).load().unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn memory_store_shares_state_between_clones() {
        let handle = MemoryStore::new();
        let mut owned = handle.clone();
        owned.save(&Config::default(), &Cursors::default()).unwrap();
        assert_eq!(handle.saves(), 1);
        assert!(handle.snapshot().is_some());
    }
}
