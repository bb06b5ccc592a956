//! The agent loop for FemtoClaw.
//!
//! One inbound message runs through a bounded cycle:
//!
//! 1. **Send** the input plus session history to the language model
//! 2. **Record** the exchange in the session
//! 3. **If the reply embeds `<tool:NAME>ARGS</tool>`**: run the tool and
//!    send its result back as the next input
//! 4. **Otherwise** the reply is final
//!
//! The cycle stops after `max_tool_iters` model calls. [`Runtime`] owns all
//! device state and lends it to the loop for one run at a time.

pub mod loop_runner;
pub mod runtime;
pub mod testing;

pub use loop_runner::{AgentLoop, AgentOutcome, ToolCall, parse_tool_call};
pub use runtime::Runtime;
