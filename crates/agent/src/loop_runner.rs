//! The agent reasoning loop implementation.

use femtoclaw_core::bounded::{Text, set_truncating, text_truncated};
use femtoclaw_core::limits::{COMBINED_CAP, TOOL_ARGS_CAP, TOOL_NAME_CAP};
use femtoclaw_core::provider::{ChatModel, ChatRequest, Reply};
use femtoclaw_tools::{ToolContext, ToolOutput, ToolRegistry, default_registry};
use std::fmt::Write;
use tracing::{debug, info, warn};

const TAG_OPEN: &str = "<tool:";
const TAG_CLOSE: &str = "</tool>";
/// Session text standing in for a tool result fed back as input.
const TOOL_RESULT_TURN: &str = "[tool_result]";

/// A tool invocation found in a model reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCall {
    pub name: Text<TOOL_NAME_CAP>,
    pub args: Text<TOOL_ARGS_CAP>,
}

/// Finds the first `<tool:NAME>ARGS</tool>` in `reply`.
///
/// A tag without `>` after the name is not a call. A missing `</tool>`
/// means empty arguments. Over-long names and arguments are cut to fit.
pub fn parse_tool_call(reply: &str) -> Option<ToolCall> {
    let open = reply.find(TAG_OPEN)?;
    let name_start = open + TAG_OPEN.len();
    let name_len = reply[name_start..].find('>')?;
    let name = &reply[name_start..name_start + name_len];
    let args_start = name_start + name_len + 1;
    let args = reply[args_start..]
        .find(TAG_CLOSE)
        .map_or("", |end| &reply[args_start..args_start + end]);
    Some(ToolCall {
        name: text_truncated(name.trim()),
        args: text_truncated(args),
    })
}

/// Result of one agent run.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentOutcome {
    /// Final model text, or the diagnostic of a failed model call
    pub reply: Reply,
    pub model_calls: u8,
    pub tool_calls: u8,
    /// The last model call failed; `reply` holds its diagnostic
    pub failed: bool,
}

/// Drives model calls and tool dispatch for one inbound message.
#[derive(Debug)]
pub struct AgentLoop {
    tools: ToolRegistry,
}

impl Default for AgentLoop {
    fn default() -> Self {
        Self::new(default_registry())
    }
}

impl AgentLoop {
    pub fn new(tools: ToolRegistry) -> Self {
        Self { tools }
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Runs the loop for `input`.
    ///
    /// Makes at most `max_tool_iters` model calls (at least one). Every
    /// exchange is appended to the session. A tool call in a reply is
    /// executed and its result becomes the next input; when the budget runs
    /// out the last reply is returned as it stands.
    pub async fn run(
        &self,
        model: &mut dyn ChatModel,
        ctx: &mut ToolContext<'_>,
        input: &str,
    ) -> AgentOutcome {
        let budget = ctx.config.agent.max_tool_iters.max(1);
        let mut combined: Text<COMBINED_CAP> = text_truncated(input);
        let mut outcome = AgentOutcome {
            reply: Reply::new(),
            model_calls: 0,
            tool_calls: 0,
            failed: false,
        };
        let mut result = ToolOutput::new();

        for iteration in 0..budget {
            let request = ChatRequest {
                settings: &ctx.config.llm,
                history: &*ctx.session,
                prompt: &combined,
            };
            outcome.model_calls += 1;
            if let Err(e) = model.complete(request, &mut outcome.reply).await {
                warn!(model = model.name(), iteration, error = %e, "Model call failed");
                outcome.reply.clear();
                if write!(outcome.reply, "{e}").is_err() {
                    set_truncating(&mut outcome.reply, "[LLM error]");
                }
                outcome.failed = true;
                return outcome;
            }

            let user_turn = if iteration == 0 { input } else { TOOL_RESULT_TURN };
            ctx.session.append("user", user_turn);
            ctx.session.append("assistant", &outcome.reply);

            let Some(call) = parse_tool_call(&outcome.reply) else {
                debug!(iteration, len = outcome.reply.len(), "Final reply");
                return outcome;
            };

            self.tools.dispatch(&call.name, &call.args, ctx, &mut result);
            outcome.tool_calls += 1;
            info!(tool = %call.name, result = %result, "Tool executed");

            combined.clear();
            if write!(combined, "[Tool {}]: {}", call.name, result).is_err() {
                debug!(tool = %call.name, "Tool result cut to fit the next prompt");
            }
        }

        debug!(budget, "Tool iteration budget exhausted");
        outcome
    }
}
