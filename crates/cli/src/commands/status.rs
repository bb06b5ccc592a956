use super::{config_path, open_runtime, shell};
use std::path::PathBuf;

pub fn run(config: Option<PathBuf>) -> anyhow::Result<()> {
    let path = config_path(config);
    let found = path.exists();
    let rt = open_runtime(Some(path.clone()))?;

    println!("FemtoClaw v{}", env!("CARGO_PKG_VERSION"));
    println!(
        "  Config    : {}{}",
        path.display(),
        if found { "" } else { " (not found, defaults)" }
    );
    println!("{}", shell::status(&rt));
    Ok(())
}
