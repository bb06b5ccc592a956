//! Tool trait, execution context and registry.
//!
//! Tools are synchronous: each one reads its JSON arguments, acts on the
//! device state borrowed through [`ToolContext`], and writes a short result
//! into a fixed buffer. There is no error channel; failures are reported in
//! the result text, which goes back to the model as the next prompt.

use femtoclaw_config::{Config, ConfigStore, Cursors};
use femtoclaw_core::bounded::Text;
use femtoclaw_core::limits::TOOL_RESULT_CAP;
use femtoclaw_core::platform::Platform;
use femtoclaw_core::session::Session;
use std::fmt::{self, Write};
use tracing::{debug, warn};

/// Tool result text.
pub type ToolOutput = Text<TOOL_RESULT_CAP>;

const MAX_TOOLS: usize = 8;

/// The device state a tool may read or change.
pub struct ToolContext<'a> {
    pub config: &'a mut Config,
    pub cursors: &'a Cursors,
    pub session: &'a mut Session,
    pub store: &'a mut dyn ConfigStore,
    pub platform: &'a dyn Platform,
}

pub trait Tool: Send + Sync {
    /// The name used in `<tool:NAME>` tags.
    fn name(&self) -> &'static str;

    /// One-line summary for `help` output.
    fn description(&self) -> &'static str;

    /// Runs the tool. `out` is empty on entry.
    fn execute(&self, args: &str, ctx: &mut ToolContext<'_>, out: &mut ToolOutput);
}

/// Writes formatted text into `out`, replacing its content. Output that does
/// not fit is cut at the last piece that did.
pub fn write_result(out: &mut ToolOutput, args: fmt::Arguments<'_>) {
    out.clear();
    if out.write_fmt(args).is_err() {
        debug!(len = out.len(), "Tool result truncated");
    }
}

/// Fixed set of tools, looked up by name.
#[derive(Default)]
pub struct ToolRegistry {
    tools: heapless::Vec<&'static dyn Tool, MAX_TOOLS>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool, replacing one with the same name. Returns `false`
    /// when the registry is full.
    pub fn register(&mut self, tool: &'static dyn Tool) -> bool {
        if let Some(slot) = self.tools.iter_mut().find(|t| t.name() == tool.name()) {
            *slot = tool;
            return true;
        }
        self.tools.push(tool).is_ok()
    }

    pub fn get(&self, name: &str) -> Option<&'static dyn Tool> {
        self.tools.iter().copied().find(|t| t.name() == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.tools.iter().map(|t| t.name())
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static dyn Tool> + '_ {
        self.tools.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Runs `name` with `args`. An unknown name produces a "not available"
    /// result instead of an error.
    pub fn dispatch(&self, name: &str, args: &str, ctx: &mut ToolContext<'_>, out: &mut ToolOutput) {
        out.clear();
        match self.get(name) {
            Some(tool) => {
                debug!(tool = name, args_len = args.len(), "Executing tool");
                tool.execute(args, ctx, out);
            }
            None => {
                warn!(tool = name, "Unknown tool requested");
                write_result(out, format_args!("[tool {name} not available]"));
            }
        }
    }
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
