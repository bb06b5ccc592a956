//! Cooperative scheduler: pollers in fixed order, then the heartbeat.

use crate::heartbeat::{Heartbeat, HeartbeatOutcome};
use femtoclaw_agent::Runtime;
use femtoclaw_channels::{DiscordPoller, PollOutcome, Poller, TelegramPoller};
use std::time::Duration;
use tracing::{debug, warn};

/// How often the binary offers the scheduler a pass.
pub const TICK: Duration = Duration::from_millis(100);

/// What one pass did.
#[derive(Debug)]
pub enum Pass {
    /// A network exchange was in flight; nothing ran
    Busy,
    Ran {
        polls: Vec<(&'static str, PollOutcome)>,
        heartbeat: HeartbeatOutcome,
    },
}

pub struct Scheduler {
    pollers: Vec<Box<dyn Poller>>,
    heartbeat: Heartbeat,
}

impl Default for Scheduler {
    /// Telegram, then Discord, then the heartbeat.
    fn default() -> Self {
        Self::new()
            .with_poller(TelegramPoller::default())
            .with_poller(DiscordPoller::default())
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("pollers", &self.pollers.iter().map(|p| p.name()).collect::<Vec<_>>())
            .field("heartbeat", &self.heartbeat)
            .finish()
    }
}

impl Scheduler {
    /// A scheduler with no pollers.
    pub fn new() -> Self {
        Self {
            pollers: Vec::new(),
            heartbeat: Heartbeat::new(),
        }
    }

    /// Appends a poller; pollers run in the order they were added.
    pub fn with_poller(mut self, poller: impl Poller + 'static) -> Self {
        self.pollers.push(Box::new(poller));
        self
    }

    pub fn with_heartbeat(mut self, heartbeat: Heartbeat) -> Self {
        self.heartbeat = heartbeat;
        self
    }

    /// Runs one pass if the network is idle.
    pub async fn run_once(&mut self, rt: &mut Runtime) -> Pass {
        if rt.is_busy() {
            debug!("Network busy, pass skipped");
            return Pass::Busy;
        }
        let mut polls = Vec::with_capacity(self.pollers.len());
        for poller in &mut self.pollers {
            let outcome = poller.poll(rt).await;
            if let PollOutcome::Failed(e) = &outcome {
                warn!(channel = poller.name(), error = %e, "Poll failed");
            }
            polls.push((poller.name(), outcome));
        }
        let heartbeat = self.heartbeat.tick(rt).await;
        Pass::Ran { polls, heartbeat }
    }
}
