//! `get_time`: milliseconds since start.

use crate::tool::{Tool, ToolContext, ToolOutput, write_result};

pub struct UptimeTool;

impl Tool for UptimeTool {
    fn name(&self) -> &'static str {
        "get_time"
    }

    fn description(&self) -> &'static str {
        "Report device uptime in milliseconds."
    }

    fn execute(&self, _args: &str, ctx: &mut ToolContext<'_>, out: &mut ToolOutput) {
        write_result(out, format_args!(r#"{{"uptime_ms":{}}}"#, ctx.platform.uptime_ms()));
    }
}
