//! The device context: every piece of mutable state in one struct.
//!
//! Pollers, the scheduler and the command interpreter all work through a
//! `&mut Runtime`. An agent run borrows the transport and request buffer
//! for the model client and everything else for the tools.

use crate::loop_runner::{AgentLoop, AgentOutcome};
use femtoclaw_config::{Config, ConfigError, ConfigStore, Cursors};
use femtoclaw_core::bounded::JsonBuf;
use femtoclaw_core::platform::Platform;
use femtoclaw_core::provider::ChatModel;
use femtoclaw_core::session::Session;
use femtoclaw_providers::LlmClient;
use femtoclaw_tools::{ToolContext, ToolOutput};
use femtoclaw_transport::{BusyFlag, Transport};
use std::sync::Arc;
use tracing::{info, warn};

pub struct Runtime {
    pub config: Config,
    pub cursors: Cursors,
    pub session: Session,
    store: Box<dyn ConfigStore>,
    platform: Arc<dyn Platform>,
    transport: Transport,
    tx: JsonBuf,
    agent: AgentLoop,
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("config", &self.config)
            .field("cursors", &self.cursors)
            .field("session_len", &self.session.len())
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}

impl Runtime {
    pub fn new(
        config: Config,
        cursors: Cursors,
        store: Box<dyn ConfigStore>,
        platform: Arc<dyn Platform>,
        transport: Transport,
    ) -> Self {
        Self {
            config,
            cursors,
            session: Session::new(),
            store,
            platform,
            transport,
            tx: JsonBuf::new(),
            agent: AgentLoop::default(),
        }
    }

    /// Builds a runtime from whatever `store` holds.
    pub fn load(
        store: Box<dyn ConfigStore>,
        platform: Arc<dyn Platform>,
        transport: Transport,
    ) -> Result<Self, ConfigError> {
        let (config, cursors) = store.load()?;
        info!(
            model = %config.llm.model,
            telegram = config.telegram.enabled,
            discord = config.discord.enabled,
            "Runtime state loaded"
        );
        Ok(Self::new(config, cursors, store, platform, transport))
    }

    /// Runs the agent against the configured language model.
    pub async fn chat(&mut self, input: &str) -> AgentOutcome {
        let Self {
            config,
            cursors,
            session,
            store,
            platform,
            transport,
            tx,
            agent,
        } = self;
        let mut model = LlmClient::new(transport, tx);
        let mut ctx = ToolContext {
            config,
            cursors,
            session,
            store: store.as_mut(),
            platform: platform.as_ref(),
        };
        agent.run(&mut model, &mut ctx, input).await
    }

    /// Runs the agent against another model.
    pub async fn chat_with(&mut self, model: &mut dyn ChatModel, input: &str) -> AgentOutcome {
        let mut ctx = ToolContext {
            config: &mut self.config,
            cursors: &self.cursors,
            session: &mut self.session,
            store: self.store.as_mut(),
            platform: self.platform.as_ref(),
        };
        self.agent.run(model, &mut ctx, input).await
    }

    /// Runs one tool directly, outside any model exchange.
    pub fn run_tool(&mut self, name: &str, args: &str) -> ToolOutput {
        let mut out = ToolOutput::new();
        let mut ctx = ToolContext {
            config: &mut self.config,
            cursors: &self.cursors,
            session: &mut self.session,
            store: self.store.as_mut(),
            platform: self.platform.as_ref(),
        };
        self.agent.tools().dispatch(name, args, &mut ctx, &mut out);
        out
    }

    /// Persists config and cursors.
    pub fn save(&mut self) -> Result<(), ConfigError> {
        self.store.save(&self.config, &self.cursors)
    }

    /// Persists, logging instead of failing.
    pub fn persist(&mut self) {
        if let Err(e) = self.save() {
            warn!(error = %e, "Failed to persist state");
        }
    }

    pub fn clear_session(&mut self) {
        self.session.clear();
        info!("Session cleared");
    }

    pub fn transport(&mut self) -> &mut Transport {
        &mut self.transport
    }

    /// Decoded body of the last network exchange.
    pub fn last_body(&self) -> &str {
        self.transport.body_text()
    }

    pub fn is_busy(&self) -> bool {
        self.transport.is_busy()
    }

    pub fn busy_flag(&self) -> BusyFlag {
        self.transport.busy_flag()
    }

    pub fn platform(&self) -> &Arc<dyn Platform> {
        &self.platform
    }
}
