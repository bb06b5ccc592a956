//! What every poller shares: the poll contract, the rate-limit gate, sender
//! admission and chunked reply delivery.

use crate::chunk::chunks;
use async_trait::async_trait;
use femtoclaw_agent::Runtime;
use femtoclaw_config::{ChannelConfig, Config};
use femtoclaw_core::bounded::{Identifier, JsonBuf, Text};
use femtoclaw_core::error::ChannelError;
use femtoclaw_core::json::escape_into;
use femtoclaw_core::limits::{JSON_OUT_CAP, POLL_BATCH, PROMPT_CAP, SEND_SETTLE};
use femtoclaw_security::AllowlistPolicy;
use femtoclaw_transport::{Peer, Request, Route, Transport};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

const FRAME_SUFFIX: &str = "\"}";

/// One message pulled from a channel, copied out of the response buffer so
/// the agent run can reuse it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inbound {
    /// Update or message ID
    pub id: Identifier,
    /// Empty when the ID was missing or overflowed
    pub sender: Identifier,
    /// Where the reply goes (Telegram chat; unused on Discord)
    pub chat: Identifier,
    pub text: Text<PROMPT_CAP>,
}

/// The messages of one fetch.
pub type Batch = heapless::Vec<Inbound, POLL_BATCH>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Switched off or missing credentials
    Disabled,
    /// The poll interval has not elapsed
    NotDue,
    /// Another network exchange is in flight
    Busy,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollStats {
    pub fetched: usize,
    pub answered: usize,
    pub rejected: usize,
    pub send_failures: usize,
}

#[derive(Debug)]
pub enum PollOutcome {
    Skipped(SkipReason),
    Failed(ChannelError),
    /// First fetch only recorded the cursor
    Primed,
    Polled(PollStats),
}

#[async_trait]
pub trait Poller: Send {
    fn name(&self) -> &'static str;

    /// Runs one poll cycle if the channel is enabled, due and idle.
    async fn poll(&mut self, rt: &mut Runtime) -> PollOutcome;
}

/// Minimum spacing between polls.
#[derive(Debug, Clone)]
pub(crate) struct Gate {
    interval: Duration,
    last: Option<Instant>,
}

impl Gate {
    pub(crate) fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Admits a poll and starts the next interval, or says why not.
    pub(crate) fn open(&mut self, enabled: bool, busy: bool) -> Result<(), SkipReason> {
        if !enabled {
            return Err(SkipReason::Disabled);
        }
        let now = Instant::now();
        if self
            .last
            .is_some_and(|last| now.duration_since(last) < self.interval)
        {
            return Err(SkipReason::NotDue);
        }
        if busy {
            return Err(SkipReason::Busy);
        }
        self.last = Some(now);
        Ok(())
    }
}

/// Decides whether `msg` may reach the agent.
pub(crate) fn admit(channel: &'static str, config: &ChannelConfig, msg: &Inbound) -> bool {
    if msg.text.is_empty() {
        debug!(channel, id = %msg.id, "Message without text ignored");
        return false;
    }
    let check = AllowlistPolicy::check_sender(config, &msg.sender);
    if !check.is_allowed() {
        warn!(channel, sender = %msg.sender, result = ?check, "Sender blocked");
        return false;
    }
    info!(channel, sender = %msg.sender, len = msg.text.len(), "Message accepted");
    true
}

/// JSON framing that opens a reply, up to the quote before the text.
pub(crate) type Prefix = Text<64>;

/// Runs the agent for each admissible message of `batch` and posts the
/// replies through `outbox`, framed by `prefix_for`.
pub(crate) async fn answer_all<P>(
    rt: &mut Runtime,
    select: fn(&Config) -> &ChannelConfig,
    batch: &Batch,
    outbox: &Outbox<'_>,
    prefix_for: P,
) -> PollStats
where
    P: Fn(&Inbound) -> Result<Prefix, ChannelError> + Send,
{
    let channel = outbox.peer.as_str();
    let mut stats = PollStats {
        fetched: batch.len(),
        ..PollStats::default()
    };
    for msg in batch {
        if !admit(channel, select(&rt.config), msg) {
            stats.rejected += 1;
            continue;
        }
        let outcome = rt.chat(&msg.text).await;
        info!(
            channel,
            model_calls = outcome.model_calls,
            tool_calls = outcome.tool_calls,
            failed = outcome.failed,
            len = outcome.reply.len(),
            "Replying"
        );
        tokio::time::sleep(SEND_SETTLE).await;
        let delivered = match prefix_for(msg) {
            Ok(prefix) => outbox.post(rt.transport(), &prefix, &outcome.reply).await,
            Err(e) => Err(e),
        };
        match delivered {
            Ok(parts) => {
                debug!(channel, parts, "Reply delivered");
                stats.answered += 1;
            }
            Err(e) => {
                warn!(channel, error = %e, body = %excerpt(rt.last_body()), "Reply not delivered");
                stats.send_failures += 1;
            }
        }
    }
    stats
}

/// Where one channel posts its replies.
pub(crate) struct Outbox<'a> {
    pub peer: Peer,
    pub host: &'a str,
    pub path: &'a str,
    /// Extra header lines, each ending in CRLF
    pub headers: &'a str,
    pub max_chars: usize,
}

impl Outbox<'_> {
    /// Posts `text` in as many messages as it takes, each framed as
    /// `prefix` + escaped part + `"}`. Stops at the first non-200 answer.
    /// Returns the number of messages sent.
    pub(crate) async fn post(
        &self,
        transport: &mut Transport,
        prefix: &str,
        text: &str,
    ) -> Result<usize, ChannelError> {
        let channel = self.peer.as_str();
        let budget = JSON_OUT_CAP.saturating_sub(prefix.len() + FRAME_SUFFIX.len());
        if budget == 0 {
            return Err(ChannelError::FrameTooLarge { channel });
        }
        let mut body = JsonBuf::new();
        let mut sent = 0;
        for part in chunks(text, self.max_chars, budget) {
            body.clear();
            if body.push_str(prefix).is_err()
                || !escape_into(part, &mut body)
                || body.push_str(FRAME_SUFFIX).is_err()
            {
                return Err(ChannelError::FrameTooLarge { channel });
            }
            let request = Request::post(self.host, self.path, body.as_bytes()).with_headers(self.headers);
            let status = transport.request(Route::Tls(self.peer), &request).await;
            if !status.is_ok() {
                return Err(ChannelError::DeliveryFailed {
                    channel,
                    status: status.as_i16(),
                });
            }
            sent += 1;
        }
        Ok(sent)
    }
}

/// The start of a response body, for log lines.
pub(crate) fn excerpt(body: &str) -> &str {
    let end = femtoclaw_core::bounded::floor_char_boundary(body, 150);
    &body[..end]
}
