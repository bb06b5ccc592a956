//! `reset_session`: forget the conversation history.

use crate::tool::{Tool, ToolContext, ToolOutput, write_result};
use tracing::info;

pub struct ResetSessionTool;

impl Tool for ResetSessionTool {
    fn name(&self) -> &'static str {
        "reset_session"
    }

    fn description(&self) -> &'static str {
        "Clear the conversation history."
    }

    fn execute(&self, _args: &str, ctx: &mut ToolContext<'_>, out: &mut ToolOutput) {
        ctx.session.clear();
        info!("Session cleared by tool");
        write_result(out, format_args!("cleared"));
    }
}
