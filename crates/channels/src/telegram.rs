//! Telegram Bot API poller.
//!
//! `getUpdates` with an offset cursor, replies through `sendMessage`. The
//! offset moves past every update observed, whether or not it is answered.

use crate::poller::{Batch, Gate, Inbound, Outbox, PollOutcome, Poller, Prefix, answer_all, excerpt};
use async_trait::async_trait;
use femtoclaw_agent::Runtime;
use femtoclaw_core::bounded::{Identifier, Text};
use femtoclaw_core::error::ChannelError;
use femtoclaw_core::json::{self, JsonInt};
use femtoclaw_core::limits::{CFG_CAP, POLL_BATCH, TELEGRAM_CHUNK, TELEGRAM_POLL_INTERVAL};
use femtoclaw_transport::{Peer, Request, Route};
use std::fmt::Write;
use std::time::Duration;
use tracing::{debug, warn};

pub const TELEGRAM_HOST: &str = "api.telegram.org";
const CHANNEL: &str = "telegram";

type ApiPath = Text<{ CFG_CAP + 64 }>;

#[derive(Debug, Clone)]
pub struct TelegramPoller {
    gate: Gate,
}

impl Default for TelegramPoller {
    fn default() -> Self {
        Self::new(TELEGRAM_POLL_INTERVAL)
    }
}

impl TelegramPoller {
    pub fn new(interval: Duration) -> Self {
        Self {
            gate: Gate::new(interval),
        }
    }
}

fn api_path(token: &str, method: std::fmt::Arguments<'_>) -> Result<ApiPath, ChannelError> {
    let mut path = ApiPath::new();
    write!(path, "/bot{token}/{method}").map_err(|_| ChannelError::FrameTooLarge { channel: CHANNEL })?;
    Ok(path)
}

/// The integer `id` of the object under `key`, as an identifier.
fn nested_id(message: &str, key: &str) -> Identifier {
    let Some(obj) = json::member(message, key) else {
        return Identifier::new();
    };
    match json::find_member(obj, "id").map(|at| json::read_integer(obj, at)) {
        Some(JsonInt::Value(v)) => Identifier::from_integer(v).unwrap_or_else(|e| {
            warn!(channel = CHANNEL, field = key, error = %e, "ID dropped");
            Identifier::new()
        }),
        _ => Identifier::new(),
    }
}

/// Extracts the updates of a `getUpdates` body.
///
/// Returns the messages to consider and the next offset. Updates below
/// `offset` were handled before and are skipped. Parsing stops when the
/// batch is full, leaving the rest for the next poll.
pub fn parse_updates(body: &str, offset: i64) -> (Batch, i64) {
    let mut batch = Batch::new();
    let mut next = offset;
    let Some(result) = json::find(body, "result") else {
        return (batch, next);
    };
    for update in json::elements(body, result) {
        let Some(JsonInt::Value(uid)) = json::find_member(update, "update_id").map(|at| json::read_integer(update, at))
        else {
            continue;
        };
        if uid < offset {
            continue;
        }
        if batch.is_full() {
            warn!(channel = CHANNEL, update_id = uid, "Batch full, update left for next poll");
            break;
        }
        next = next.max(uid.saturating_add(1));

        let Some(message) = json::member(update, "message") else {
            debug!(channel = CHANNEL, update_id = uid, "Update without message");
            continue;
        };
        let mut msg = Inbound {
            id: Identifier::from_integer(uid).unwrap_or_default(),
            sender: nested_id(message, "from"),
            chat: nested_id(message, "chat"),
            text: Text::new(),
        };
        if let Some(at) = json::find_member(message, "text") {
            let decoded = json::read_string(message, at, &mut msg.text);
            if decoded.is_some_and(|d| !d.is_complete()) {
                debug!(channel = CHANNEL, update_id = uid, "Message text cut to fit");
            }
        }
        // Cannot overflow: fullness was checked above.
        let _ = batch.push(msg);
    }
    (batch, next)
}

#[async_trait]
impl Poller for TelegramPoller {
    fn name(&self) -> &'static str {
        CHANNEL
    }

    async fn poll(&mut self, rt: &mut Runtime) -> PollOutcome {
        let channel = &rt.config.telegram;
        let enabled = channel.enabled && !channel.token.is_empty();
        if let Err(reason) = self.gate.open(enabled, rt.is_busy()) {
            return PollOutcome::Skipped(reason);
        }

        let offset = rt.cursors.telegram_offset;
        let updates = match api_path(
            &rt.config.telegram.token,
            format_args!("getUpdates?offset={offset}&timeout=1&limit={POLL_BATCH}"),
        ) {
            Ok(path) => path,
            Err(e) => return PollOutcome::Failed(e),
        };
        let status = rt
            .transport()
            .request(Route::Tls(Peer::Telegram), &Request::get(TELEGRAM_HOST, &updates))
            .await;
        if !status.is_ok() {
            warn!(channel = CHANNEL, status = %status, body = %excerpt(rt.last_body()), "Poll failed");
            return PollOutcome::Failed(ChannelError::FetchFailed {
                channel: CHANNEL,
                status: status.as_i16(),
            });
        }

        let (batch, next) = parse_updates(rt.last_body(), offset);
        if next != offset {
            rt.cursors.telegram_offset = next;
            rt.persist();
            debug!(channel = CHANNEL, offset = next, "Cursor advanced");
        }
        if batch.is_empty() {
            return PollOutcome::Polled(Default::default());
        }

        let send_path = match api_path(&rt.config.telegram.token, format_args!("sendMessage")) {
            Ok(path) => path,
            Err(e) => return PollOutcome::Failed(e),
        };
        let outbox = Outbox {
            peer: Peer::Telegram,
            host: TELEGRAM_HOST,
            path: &send_path,
            headers: "",
            max_chars: TELEGRAM_CHUNK,
        };
        let stats = answer_all(rt, |c| &c.telegram, &batch, &outbox, |msg| {
            let mut prefix = Prefix::new();
            write!(prefix, "{{\"chat_id\":\"{}\",\"text\":\"", msg.chat)
                .map_err(|_| ChannelError::FrameTooLarge { channel: CHANNEL })?;
            Ok(prefix)
        })
        .await;
        PollOutcome::Polled(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_private_message() {
        let body = r#"{"ok":true,"result":[{"update_id":100,"message":{"message_id":7,
            "from":{"id":42,"is_bot":false,"first_name":"A"},
            "chat":{"id":42,"type":"private"},"date":1,"text":"hello \"bot\""}}]}"#;
        let (batch, next) = parse_updates(body, 0);
        assert_eq!(next, 101);
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].id.as_str(), "100");
        assert_eq!(batch[0].sender.as_str(), "42");
        assert_eq!(batch[0].chat.as_str(), "42");
        assert_eq!(batch[0].text.as_str(), "hello \"bot\"");
    }

    #[test]
    fn group_chat_ids_keep_their_sign() {
        let body = r#"{"result":[{"update_id":5,"message":{"from":{"id":9},"chat":{"id":-1001234567890},"text":"x"}}]}"#;
        let (batch, _) = parse_updates(body, 0);
        assert_eq!(batch[0].chat.as_str(), "-1001234567890");
    }

    #[test]
    fn sender_id_does_not_leak_from_reply_target() {
        // "from" of the quoted message must not stand in for a missing sender.
        let body = r#"{"result":[{"update_id":5,"message":{"reply_to_message":{"from":{"id":1}},
            "chat":{"id":3},"text":"x"}}]}"#;
        let (batch, _) = parse_updates(body, 0);
        assert!(batch[0].sender.is_empty());
    }

    #[test]
    fn updates_without_text_still_move_the_cursor() {
        let body = r#"{"result":[
            {"update_id":10,"edited_message":{"text":"e"}},
            {"update_id":11,"message":{"from":{"id":1},"chat":{"id":1},"sticker":{}}}]}"#;
        let (batch, next) = parse_updates(body, 0);
        assert_eq!(next, 12);
        assert_eq!(batch.len(), 1);
        assert!(batch[0].text.is_empty());
    }

    #[test]
    fn old_updates_are_skipped() {
        let body = r#"{"result":[{"update_id":4,"message":{"text":"old"}},{"update_id":6,"message":{"text":"new"}}]}"#;
        let (batch, next) = parse_updates(body, 5);
        assert_eq!(next, 7);
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].text.as_str(), "new");
    }

    #[test]
    fn empty_or_broken_bodies_keep_the_cursor() {
        assert_eq!(parse_updates(r#"{"ok":true,"result":[]}"#, 9).1, 9);
        assert_eq!(parse_updates("", 9).1, 9);
        assert_eq!(parse_updates(r#"{"ok":false,"description":"Unauthorized"}"#, 9).1, 9);
    }

    #[test]
    fn truncated_body_yields_what_survived() {
        let body = r#"{"result":[{"update_id":1,"message":{"from":{"id":2},"chat":{"id":2},"text":"a"}},{"update_id":2,"mess"#;
        let (batch, next) = parse_updates(body, 0);
        assert_eq!(next, 3);
        assert_eq!(batch.len(), 1);
    }

    #[test]
    fn full_batch_leaves_rest_for_next_poll() {
        let mut body = String::from(r#"{"result":["#);
        for uid in 1..=6 {
            if uid > 1 {
                body.push(',');
            }
            body.push_str(&format!(r#"{{"update_id":{uid},"message":{{"text":"m"}}}}"#));
        }
        body.push_str("]}");
        let (batch, next) = parse_updates(&body, 0);
        assert_eq!(batch.len(), POLL_BATCH);
        assert_eq!(next, 6);
    }

    #[test]
    fn long_token_is_refused() {
        let token = "t".repeat(CFG_CAP + 64);
        assert!(matches!(
            api_path(&token, format_args!("sendMessage")),
            Err(ChannelError::FrameTooLarge { channel: "telegram" })
        ));
    }
}
