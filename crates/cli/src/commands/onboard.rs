use super::config_path;
use anyhow::Context;
use femtoclaw_config::Config;
use std::path::PathBuf;

pub fn run(config: Option<PathBuf>) -> anyhow::Result<()> {
    let path = config_path(config);

    if path.exists() {
        println!("Config already exists at {}", path.display());
        println!("Edit it directly or use `set <key> <value>` in `femtoclaw run`.");
        return Ok(());
    }
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    std::fs::write(&path, Config::default_toml())
        .with_context(|| format!("writing {}", path.display()))?;

    println!("Created {}", path.display());
    println!();
    println!("Next steps:");
    println!("  1. Add your API key: export FEMTOCLAW_API_KEY=\"sk-...\"");
    println!("  2. Try it:           femtoclaw agent -m \"hello\"");
    println!("  3. Add a channel:    femtoclaw run, then `tg token <token>`");
    Ok(())
}
