//! `message`: print text on the device console.

use crate::tool::{Tool, ToolContext, ToolOutput, write_result};
use femtoclaw_core::json::{find_member, read_string};
use femtoclaw_core::limits::PROMPT_CAP;
use femtoclaw_core::bounded::Text;

pub struct MessageTool;

impl Tool for MessageTool {
    fn name(&self) -> &'static str {
        "message"
    }

    fn description(&self) -> &'static str {
        "Print a message on the device console. Args: {\"text\":\"...\"}"
    }

    fn execute(&self, args: &str, ctx: &mut ToolContext<'_>, out: &mut ToolOutput) {
        let mut text: Text<PROMPT_CAP> = Text::new();
        let decoded = find_member(args, "text").and_then(|at| read_string(args, at, &mut text));
        match decoded {
            Some(_) => ctx.platform.announce(&text),
            // Not a {"text": ...} object: show the arguments as given.
            None => ctx.platform.announce(args.trim()),
        }
        write_result(out, format_args!("sent"));
    }
}
