//! OpenAI-compatible chat-completions client.
//!
//! Request bodies are built by hand into a fixed buffer; replies are read
//! straight out of the transport's response buffer with the micro-JSON
//! helpers. Nothing is allocated per request.

use crate::endpoint::Endpoint;
use async_trait::async_trait;
use femtoclaw_core::bounded::{JsonBuf, Text, set_truncating, text_truncated};
use femtoclaw_core::error::{ParseStage, ProviderError};
use femtoclaw_core::json::{escape_into, escaped_len, find, find_from, read_string};
use femtoclaw_core::limits::{CFG_CAP, JSON_OUT_CAP};
use femtoclaw_core::provider::{ChatModel, ChatRequest, Reply, ReplySource};
use femtoclaw_transport::{Request, Transport};
use std::fmt::Write;
use tracing::{debug, info, warn};

/// Reply used when the model answered with nothing at all.
pub const EMPTY_REPLY: &str = "[model returned empty response]";

/// `{"role":"","content":""},` without the role and content text.
const MESSAGE_OVERHEAD: usize = 25;
const BODY_TAIL: &str = "]}";

/// The LM client. Borrows the transport and the outbound body buffer for
/// the duration of one agent run.
pub struct LlmClient<'a> {
    transport: &'a mut Transport,
    body: &'a mut JsonBuf,
}

impl<'a> LlmClient<'a> {
    pub fn new(transport: &'a mut Transport, body: &'a mut JsonBuf) -> Self {
        Self { transport, body }
    }
}

#[async_trait]
impl ChatModel for LlmClient<'_> {
    fn name(&self) -> &str {
        "openai-compat"
    }

    async fn complete(
        &mut self,
        request: ChatRequest<'_>,
        reply: &mut Reply,
    ) -> Result<ReplySource, ProviderError> {
        reply.clear();
        let settings = request.settings;
        let endpoint = Endpoint::parse(&settings.api_base)?;
        let path = endpoint.completions_path()?;
        build_request_body(&request, self.body)?;

        let mut auth: Text<{ CFG_CAP + 32 }> = Text::new();
        write!(auth, "Authorization: Bearer {}\r\n", settings.api_key)
            .map_err(|_| ProviderError::RequestTooLarge)?;

        debug!(
            host = endpoint.host,
            model = %settings.model,
            body_len = self.body.len(),
            "Sending completion request"
        );
        let req = Request::post(endpoint.host, &path, self.body.as_bytes()).with_headers(&auth);
        let status = self.transport.request(endpoint.route(), &req).await;
        let body = self.transport.body_text();

        if !status.is_ok() {
            warn!(%status, host = endpoint.host, "LLM request failed");
            return Err(ProviderError::Http {
                status: status.as_i16(),
                excerpt: text_truncated(body),
            });
        }
        parse_reply(body, reply)
    }
}

fn message_cost(role: &str, content: &str) -> usize {
    MESSAGE_OVERHEAD + escaped_len(role) + escaped_len(content)
}

fn too_large<E>(_: E) -> ProviderError {
    ProviderError::RequestTooLarge
}

fn push_escaped(out: &mut JsonBuf, s: &str) -> Result<(), ProviderError> {
    if escape_into(s, out) {
        Ok(())
    } else {
        Err(ProviderError::RequestTooLarge)
    }
}

fn push_message(
    out: &mut JsonBuf,
    role: &str,
    content: &str,
    first: &mut bool,
) -> Result<(), ProviderError> {
    if !std::mem::take(first) {
        out.push(',').map_err(too_large)?;
    }
    out.push_str(r#"{"role":""#).map_err(too_large)?;
    push_escaped(out, role)?;
    out.push_str(r#"","content":""#).map_err(too_large)?;
    push_escaped(out, content)?;
    out.push_str(r#""}"#).map_err(too_large)
}

/// Serializes a chat-completion request into `out`.
///
/// Layout: generation parameters, the system prompt (when set), as much
/// history as fits (newest turns kept), then the new user turn. Fails only
/// when the parameters, system prompt and user turn alone do not fit.
pub fn build_request_body(request: &ChatRequest<'_>, out: &mut JsonBuf) -> Result<(), ProviderError> {
    let settings = request.settings;
    out.clear();
    out.push_str(r#"{"model":""#).map_err(too_large)?;
    push_escaped(out, &settings.model)?;
    write!(
        out,
        r#"","max_tokens":{},"temperature":{:.2},"stream":false,"messages":["#,
        settings.max_tokens, settings.temperature
    )
    .map_err(too_large)?;

    let mut first = true;
    if !settings.system_prompt.is_empty() {
        push_message(out, "system", &settings.system_prompt, &mut first)?;
    }

    let reserved = out.len() + message_cost("user", request.prompt) + BODY_TAIL.len();
    let budget = JSON_OUT_CAP.saturating_sub(reserved);
    let mut kept = 0usize;
    for turn in request
        .history
        .render(budget, |t| message_cost(t.role, t.content))
    {
        push_message(out, turn.role, turn.content, &mut first)?;
        kept += 1;
    }
    push_message(out, "user", request.prompt, &mut first)?;
    out.push_str(BODY_TAIL).map_err(too_large)?;

    debug!(turns = kept, len = out.len(), "Request body built");
    Ok(())
}

fn missing(stage: ParseStage, json: &str) -> ProviderError {
    warn!(%stage, "LLM response missing field");
    ProviderError::MissingField {
        stage,
        excerpt: text_truncated(json),
    }
}

/// Extracts the reply text from a 200 response body.
///
/// Bytes before the first `{` are skipped. `choices`, `message` and
/// `content` must appear in that order. An empty or null `content` falls
/// back to `reasoning_content`, then `reasoning`, then [`EMPTY_REPLY`].
pub fn parse_reply(body: &str, reply: &mut Reply) -> Result<ReplySource, ProviderError> {
    reply.clear();
    let Some(start) = body.find('{') else {
        warn!("LLM response has no JSON object");
        return Err(ProviderError::NoJson {
            excerpt: text_truncated(body),
        });
    };
    let json = &body[start..];

    let choices = find(json, "choices").ok_or_else(|| missing(ParseStage::Choices, json))?;
    let message =
        find_from(json, choices, "message").ok_or_else(|| missing(ParseStage::Message, json))?;
    let content =
        find_from(json, message, "content").ok_or_else(|| missing(ParseStage::Content, json))?;

    if let Some(decoded) = read_string(json, content, reply) {
        if !decoded.is_complete() {
            debug!(?decoded, "Reply content cut short");
        }
    }
    if !reply.is_empty() {
        return Ok(ReplySource::Content);
    }

    for (key, source) in [
        ("reasoning_content", ReplySource::ReasoningContent),
        ("reasoning", ReplySource::Reasoning),
    ] {
        if let Some(at) = find_from(json, message, key) {
            read_string(json, at, reply);
            if !reply.is_empty() {
                info!(field = key, "Used reasoning field for reply");
                return Ok(source);
            }
        }
    }

    set_truncating(reply, EMPTY_REPLY);
    Ok(ReplySource::Placeholder)
}
