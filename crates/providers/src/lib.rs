//! Language-model client for FemtoClaw.
//!
//! The client speaks the OpenAI-compatible chat-completions protocol, which
//! covers OpenRouter, OpenAI, Ollama and most self-hosted servers. It
//! implements `femtoclaw_core::ChatModel` over the shared transport.

pub mod endpoint;
pub mod openai_compat;

pub use endpoint::{Endpoint, Scheme};
pub use openai_compat::{EMPTY_REPLY, LlmClient, build_request_body, parse_reply};
