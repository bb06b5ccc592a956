use super::open_runtime;
use std::path::PathBuf;
use tracing::warn;

pub async fn run(config: Option<PathBuf>, message: &str) -> anyhow::Result<()> {
    let mut rt = open_runtime(config)?;
    if rt.config.llm.api_key.is_empty() {
        warn!("No API key configured. Set FEMTOCLAW_API_KEY or run `set llm_api_key <key>` in the shell.");
    }

    let outcome = rt.chat(message).await;
    println!("{}", outcome.reply);
    if outcome.failed {
        anyhow::bail!("model call failed after {} attempt(s)", outcome.model_calls);
    }
    Ok(())
}
