//! Independent periodic liveness task.

use femtoclaw_core::platform::Platform;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// Calls [`Platform::keepalive`] every `period` until the handle is aborted.
///
/// Runs as its own task, so it keeps going while the scheduler waits on the
/// network.
pub fn spawn_liveness(platform: Arc<dyn Platform>, period: Duration) -> JoinHandle<()> {
    debug!(period_ms = period.as_millis() as u64, "Liveness task started");
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            platform.keepalive();
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use femtoclaw_core::platform::StubPlatform;
    use femtoclaw_core::limits::LIVENESS_INTERVAL;

    #[tokio::test(start_paused = true)]
    async fn ticks_while_other_work_waits() {
        let platform = Arc::new(StubPlatform::new());
        let handle = spawn_liveness(platform.clone(), LIVENESS_INTERVAL);

        // Stands in for a long network wait on the main task.
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(platform.keepalives() >= 5, "got {}", platform.keepalives());
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn stops_when_aborted() {
        let platform = Arc::new(StubPlatform::new());
        let handle = spawn_liveness(platform.clone(), LIVENESS_INTERVAL);
        tokio::time::sleep(Duration::from_millis(500)).await;
        handle.abort();
        let _ = handle.await;

        let seen = platform.keepalives();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(platform.keepalives(), seen);
    }
}
