//! Periodic self-report through the agent.

use femtoclaw_agent::Runtime;
use femtoclaw_core::provider::Reply;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

pub const HEARTBEAT_PROMPT: &str =
    "You are a scheduled heartbeat on an MCU. Report uptime and WiFi status in one short sentence.";

#[derive(Debug, Clone, PartialEq)]
pub enum HeartbeatOutcome {
    /// `heartbeat_ms` is 0
    Disabled,
    NotDue,
    Busy,
    /// The network is down; the report waits for the next period
    Offline,
    Reported(Reply),
}

/// Runs the agent every `heartbeat_ms`, counted from creation.
#[derive(Debug, Clone)]
pub struct Heartbeat {
    last: Instant,
}

impl Default for Heartbeat {
    fn default() -> Self {
        Self::new()
    }
}

impl Heartbeat {
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
        }
    }

    /// Reports if a period has passed since the last report. The period is
    /// read from the config on every call.
    pub async fn tick(&mut self, rt: &mut Runtime) -> HeartbeatOutcome {
        let period_ms = rt.config.agent.heartbeat_ms;
        if period_ms == 0 {
            return HeartbeatOutcome::Disabled;
        }
        let now = Instant::now();
        if now.duration_since(self.last) < Duration::from_millis(u64::from(period_ms)) {
            return HeartbeatOutcome::NotDue;
        }
        if rt.is_busy() {
            return HeartbeatOutcome::Busy;
        }
        self.last = now;

        if !rt.platform().network().connected {
            warn!("Network down, heartbeat skipped");
            return HeartbeatOutcome::Offline;
        }

        debug!(period_ms, "Heartbeat running");
        let outcome = rt.chat(HEARTBEAT_PROMPT).await;
        info!(failed = outcome.failed, reply = %outcome.reply, "Heartbeat");
        HeartbeatOutcome::Reported(outcome.reply)
    }
}
