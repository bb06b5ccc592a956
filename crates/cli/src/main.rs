//! FemtoClaw CLI: the main entry point.
//!
//! Commands:
//! - `run`     : Pollers, heartbeat and the interactive command shell
//! - `agent`   : One agent run for a single message
//! - `status`  : Show device status
//! - `onboard` : Write a default config file

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod platform;

#[derive(Parser)]
#[command(
    name = "femtoclaw",
    about = "FemtoClaw: a conversational agent for memory-constrained devices",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (default: ~/.femtoclaw/config.toml)
    #[arg(long, global = true, env = "FEMTOCLAW_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll channels and serve the command shell on stdin
    Run,

    /// Send one message through the agent and print the reply
    Agent {
        #[arg(short, long)]
        message: String,
    },

    /// Show device status
    Status,

    /// Write a default configuration file
    Onboard,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout belongs to the shell.
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Run => commands::run::run(cli.config).await?,
        Commands::Agent { message } => commands::agent::run(cli.config, &message).await?,
        Commands::Status => commands::status::run(cli.config)?,
        Commands::Onboard => commands::onboard::run(cli.config)?,
    }

    Ok(())
}
