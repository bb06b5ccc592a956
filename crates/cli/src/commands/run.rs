//! Foreground service: channel pollers and heartbeat on a fixed tick,
//! console commands from stdin in between.

use super::{open_runtime, shell};
use femtoclaw_core::limits::LIVENESS_INTERVAL;
use femtoclaw_workflow::{Scheduler, TICK, spawn_liveness};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;
use tracing::info;

fn prompt() {
    print!("femtoclaw> ");
    let _ = std::io::stdout().flush();
}

pub async fn run(config: Option<PathBuf>) -> anyhow::Result<()> {
    let mut rt = open_runtime(config)?;
    let liveness = spawn_liveness(rt.platform().clone(), LIVENESS_INTERVAL);
    let mut scheduler = Scheduler::default();
    let mut ticker = tokio::time::interval(TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut console = true;

    info!(
        telegram = rt.config.telegram.enabled,
        discord = rt.config.discord.enabled,
        heartbeat_ms = rt.config.agent.heartbeat_ms,
        "FemtoClaw running"
    );
    println!("FemtoClaw v{}. Type 'help' for commands.", env!("CARGO_PKG_VERSION"));
    prompt();

    loop {
        tokio::select! {
            line = lines.next_line(), if console => match line? {
                Some(line) => {
                    let out = shell::execute(&mut rt, &line).await;
                    if !out.is_empty() {
                        println!("{out}");
                    }
                    prompt();
                }
                // Detached from a terminal: keep serving the channels.
                None => console = false,
            },
            _ = ticker.tick() => {
                scheduler.run_once(&mut rt).await;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
        }
    }

    liveness.abort();
    rt.persist();
    Ok(())
}
