//! `get_config`: a secret-free summary of the configuration.

use crate::tool::{Tool, ToolContext, ToolOutput, write_result};
use femtoclaw_core::bounded::Text;
use femtoclaw_core::json::escape_into;
use femtoclaw_core::limits::{MODEL_CAP, PROVIDER_CAP};

pub struct GetConfigTool;

impl Tool for GetConfigTool {
    fn name(&self) -> &'static str {
        "get_config"
    }

    fn description(&self) -> &'static str {
        "Summarize model, provider and enabled channels. Never includes credentials."
    }

    fn execute(&self, _args: &str, ctx: &mut ToolContext<'_>, out: &mut ToolOutput) {
        let mut model: Text<{ MODEL_CAP * 2 }> = Text::new();
        let mut provider: Text<{ PROVIDER_CAP * 2 }> = Text::new();
        escape_into(&ctx.config.llm.model, &mut model);
        escape_into(&ctx.config.llm.provider, &mut provider);
        write_result(
            out,
            format_args!(
                r#"{{"model":"{}","provider":"{}","tg":{},"dc":{},"uptime":{}}}"#,
                model,
                provider,
                ctx.config.telegram.enabled,
                ctx.config.discord.enabled,
                ctx.platform.uptime_ms()
            ),
        );
    }
}
