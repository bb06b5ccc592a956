//! Built-in device tools for FemtoClaw.
//!
//! The model invokes a tool by embedding `<tool:NAME>JSON-ARGS</tool>` in
//! its reply. The set is fixed: console message, network info, uptime,
//! config read/write and session reset.

pub mod get_config;
pub mod message;
pub mod reset_session;
pub mod set_config;
pub mod tool;
pub mod uptime;
pub mod wifi_info;

pub use tool::{Tool, ToolContext, ToolOutput, ToolRegistry, write_result};

/// Registry holding every built-in tool.
pub fn default_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(&message::MessageTool);
    registry.register(&wifi_info::WifiInfoTool);
    registry.register(&uptime::UptimeTool);
    registry.register(&set_config::SetConfigTool);
    registry.register(&get_config::GetConfigTool);
    registry.register(&reset_session::ResetSessionTool);
    registry
}
