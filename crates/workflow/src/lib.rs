//! Workflow engine: the cooperative scheduler, the heartbeat self-report
//! and the liveness task.
//!
//! One pass of the [`Scheduler`] runs every poller and then the heartbeat,
//! in that order, and only while no network exchange is in flight. The
//! liveness task is independent of the pass and keeps ticking through long
//! network waits.

pub mod heartbeat;
pub mod liveness;
pub mod scheduler;

pub use heartbeat::{HEARTBEAT_PROMPT, Heartbeat, HeartbeatOutcome};
pub use liveness::spawn_liveness;
pub use scheduler::{Pass, Scheduler, TICK};
