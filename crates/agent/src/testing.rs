//! Scripted language model for tests.

use async_trait::async_trait;
use femtoclaw_core::bounded::set_truncating;
use femtoclaw_core::error::ProviderError;
use femtoclaw_core::provider::{ChatModel, ChatRequest, Reply, ReplySource};
use std::collections::VecDeque;

/// A model that plays back queued replies and records every prompt.
///
/// When the queue runs dry the last reply repeats, so "always answers with
/// a tool call" is one queued entry.
#[derive(Debug, Default)]
pub struct ScriptedModel {
    replies: VecDeque<Result<String, ProviderError>>,
    last: Option<Result<String, ProviderError>>,
    /// Prompts received, in order
    pub prompts: Vec<String>,
    /// Session turn count seen by each call
    pub history_turns: Vec<usize>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, text: &str) -> Self {
        self.replies.push_back(Ok(text.to_owned()));
        self
    }

    pub fn fail(mut self, error: ProviderError) -> Self {
        self.replies.push_back(Err(error));
        self
    }

    pub fn calls(&self) -> usize {
        self.prompts.len()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &mut self,
        request: ChatRequest<'_>,
        reply: &mut Reply,
    ) -> Result<ReplySource, ProviderError> {
        self.prompts.push(request.prompt.to_owned());
        self.history_turns.push(request.history.turns().count());
        reply.clear();

        if let Some(next) = self.replies.pop_front() {
            self.last = Some(next);
        }
        match &self.last {
            Some(Ok(text)) => {
                set_truncating(reply, text);
                Ok(ReplySource::Content)
            }
            Some(Err(e)) => Err(e.clone()),
            None => Err(ProviderError::InvalidEndpoint),
        }
    }
}
