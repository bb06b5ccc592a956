pub mod agent;
pub mod onboard;
pub mod run;
pub mod shell;
pub mod status;

use crate::platform::HostPlatform;
use anyhow::Context;
use femtoclaw_agent::Runtime;
use femtoclaw_config::{Config, TomlFileStore};
use femtoclaw_transport::Transport;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

pub fn config_path(path: Option<PathBuf>) -> PathBuf {
    path.unwrap_or_else(Config::default_path)
}

/// Loads persisted state, applies environment overrides and wires the
/// host platform and network stack.
pub fn open_runtime(path: Option<PathBuf>) -> anyhow::Result<Runtime> {
    let path = config_path(path);
    let store = TomlFileStore::new(&path);
    let mut rt = Runtime::load(Box::new(store), Arc::new(HostPlatform::new()), Transport::new())
        .with_context(|| format!("loading {}", path.display()))?;
    rt.config.apply_env_overrides();
    // The shell can still fix an incomplete config at runtime.
    if let Err(e) = rt.config.validate() {
        warn!(error = %e, "Configuration incomplete");
    }
    Ok(rt)
}
