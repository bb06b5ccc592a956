//! `set_config`: change one configuration field and persist it.

use crate::tool::{Tool, ToolContext, ToolOutput, write_result};
use femtoclaw_core::bounded::Text;
use femtoclaw_core::json::{Decoded, find_member, read_string, value_span};
use femtoclaw_core::limits::{SYSTEM_PROMPT_CAP, TOOL_NAME_CAP};
use tracing::{info, warn};

pub struct SetConfigTool;

impl Tool for SetConfigTool {
    fn name(&self) -> &'static str {
        "set_config"
    }

    fn description(&self) -> &'static str {
        "Set one configuration field. Args: {\"key\":\"llm_model\",\"value\":\"...\"}"
    }

    fn execute(&self, args: &str, ctx: &mut ToolContext<'_>, out: &mut ToolOutput) {
        let mut key: Text<TOOL_NAME_CAP> = Text::new();
        if find_member(args, "key")
            .and_then(|at| read_string(args, at, &mut key))
            .is_none()
            || key.is_empty()
        {
            write_result(out, format_args!("set_config needs a \"key\""));
            return;
        }

        // Numbers may arrive unquoted.
        let mut value: Text<SYSTEM_PROMPT_CAP> = Text::new();
        if let Some(at) = find_member(args, "value") {
            let fitted = match read_string(args, at, &mut value) {
                Some(decoded) => decoded != Decoded::Truncated,
                None => value.push_str(value_span(args, at)).is_ok(),
            };
            if !fitted {
                write_result(out, format_args!("set {key} failed: value too long"));
                return;
            }
        }

        if let Err(e) = ctx.config.set(&key, &value) {
            warn!(key = %key, error = %e, "set_config rejected");
            write_result(out, format_args!("set {key} failed: {e}"));
            return;
        }
        match ctx.store.save(ctx.config, ctx.cursors) {
            Ok(()) => {
                info!(key = %key, "Config updated by tool");
                write_result(out, format_args!("set {key} ok"));
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Config save failed");
                write_result(out, format_args!("set {key} ok (not saved: {e})"));
            }
        }
    }
}
