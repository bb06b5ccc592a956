//! ChatModel trait: the abstraction over the language-model backend.
//!
//! A ChatModel takes the session history plus one new user turn and writes
//! the model's reply text into a caller-owned bounded buffer.
//!
//! Implementations: the chat-completions client in `femtoclaw-providers`,
//! scripted models in tests.

use crate::bounded::Text;
use crate::error::ProviderError;
use crate::limits::{CFG_CAP, MODEL_CAP, PROVIDER_CAP, REPLY_CAP, SYSTEM_PROMPT_CAP};
use crate::session::Session;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Model reply text.
pub type Reply = Text<REPLY_CAP>;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are FemtoClaw, a concise assistant running on a \
microcontroller. To use a tool, reply with <tool:NAME>JSON-ARGS</tool> and nothing else. \
Tools: message {\"text\"}, get_wifi_info, get_time, set_config {\"key\",\"value\"}, \
get_config, reset_session.";

/// Backend endpoint and generation parameters.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmSettings {
    /// Provider label (e.g., "openrouter", "ollama"); informational only
    #[serde(default = "default_provider")]
    pub provider: Text<PROVIDER_CAP>,

    /// Base URL; `/chat/completions` is appended
    #[serde(default = "default_api_base")]
    pub api_base: Text<CFG_CAP>,

    #[serde(default)]
    pub api_key: Text<CFG_CAP>,

    #[serde(default = "default_model")]
    pub model: Text<MODEL_CAP>,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u16,

    /// Temperature (0.0 = deterministic, 2.0 = most random)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Sent as a leading system message when non-empty
    #[serde(default = "default_system_prompt")]
    pub system_prompt: Text<SYSTEM_PROMPT_CAP>,
}

fn default_provider() -> Text<PROVIDER_CAP> {
    crate::bounded::text_truncated("openrouter")
}

fn default_api_base() -> Text<CFG_CAP> {
    crate::bounded::text_truncated("https://openrouter.ai/api/v1")
}

fn default_model() -> Text<MODEL_CAP> {
    crate::bounded::text_truncated("meta-llama/llama-3.1-8b-instruct:free")
}

fn default_max_tokens() -> u16 {
    512
}

fn default_temperature() -> f32 {
    0.7
}

fn default_system_prompt() -> Text<SYSTEM_PROMPT_CAP> {
    crate::bounded::text_truncated(DEFAULT_SYSTEM_PROMPT)
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            api_base: default_api_base(),
            api_key: Text::new(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            system_prompt: default_system_prompt(),
        }
    }
}

impl fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmSettings")
            .field("provider", &self.provider)
            .field("api_base", &self.api_base)
            .field("api_key", &if self.api_key.is_empty() { "(none)" } else { "[REDACTED]" })
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("system_prompt_len", &self.system_prompt.len())
            .finish()
    }
}

/// Everything one completion call needs, borrowed from the runtime.
#[derive(Clone, Copy)]
pub struct ChatRequest<'a> {
    pub settings: &'a LlmSettings,
    pub history: &'a Session,
    pub prompt: &'a str,
}

/// Which response field the reply text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    Content,
    ReasoningContent,
    Reasoning,
    /// Every candidate field was empty; a fixed placeholder was used.
    Placeholder,
}

#[async_trait]
pub trait ChatModel: Send {
    fn name(&self) -> &str;

    /// Runs one completion. On success `reply` holds the model text; on
    /// failure it is left empty and the error's `Display` is the diagnostic.
    async fn complete(
        &mut self,
        request: ChatRequest<'_>,
        reply: &mut Reply,
    ) -> Result<ReplySource, ProviderError>;
}
