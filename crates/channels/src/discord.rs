//! Discord REST poller.
//!
//! Reads `GET /channels/{id}/messages?after=X` and posts replies to the
//! same channel. The very first fetch asks for the newest message only and
//! records its ID, so enabling the channel never replays its history.

use crate::poller::{Batch, Gate, Inbound, Outbox, PollOutcome, Poller, Prefix, answer_all, excerpt};
use async_trait::async_trait;
use femtoclaw_agent::Runtime;
use femtoclaw_core::bounded::{Identifier, Text, snowflake_cmp};
use femtoclaw_core::error::ChannelError;
use femtoclaw_core::json;
use femtoclaw_core::limits::{CFG_CAP, DISCORD_CHUNK, DISCORD_POLL_INTERVAL, ID_CAP, POLL_BATCH};
use femtoclaw_transport::{Peer, Request, Route};
use std::fmt::Write;
use std::time::Duration;
use tracing::{debug, warn};

pub const DISCORD_HOST: &str = "discord.com";
const CHANNEL: &str = "discord";

type ApiPath = Text<{ CFG_CAP + 64 }>;
type AuthHeader = Text<{ CFG_CAP + 32 }>;

#[derive(Debug, Clone)]
pub struct DiscordPoller {
    gate: Gate,
}

impl Default for DiscordPoller {
    fn default() -> Self {
        Self::new(DISCORD_POLL_INTERVAL)
    }
}

impl DiscordPoller {
    pub fn new(interval: Duration) -> Self {
        Self {
            gate: Gate::new(interval),
        }
    }
}

fn too_large() -> ChannelError {
    ChannelError::FrameTooLarge { channel: CHANNEL }
}

/// The string-valued ID under `key`, or an empty identifier when it is
/// missing, cut off or too long.
fn string_id(obj: &str, key: &str) -> Identifier {
    let mut raw: Text<{ ID_CAP * 2 }> = Text::new();
    let complete = json::find_member(obj, key)
        .and_then(|at| json::read_string(obj, at, &mut raw))
        .is_some_and(|d| d.is_complete());
    if !complete {
        return Identifier::new();
    }
    Identifier::parse(&raw).unwrap_or_else(|e| {
        warn!(channel = CHANNEL, field = key, error = %e, "ID dropped");
        Identifier::new()
    })
}

/// Newest-first message list parsed against the last seen ID.
#[derive(Debug, Default)]
pub struct Fetched {
    /// Messages newer than the cursor from human authors, oldest first
    pub batch: Batch,
    /// Highest ID seen that is newer than the cursor, bots included
    pub newest: Identifier,
}

/// Extracts the messages of a channel listing.
///
/// With an empty `since` only `newest` is filled in.
pub fn parse_messages(body: &str, since: &Identifier) -> Fetched {
    let mut fetched = Fetched::default();
    for message in json::elements(body, 0) {
        let id = string_id(message, "id");
        if !id.is_newer_than(since) {
            continue;
        }
        if id.is_newer_than(&fetched.newest) {
            fetched.newest = id.clone();
        }
        if since.is_empty() {
            continue;
        }

        let author = json::member(message, "author");
        let from_bot = author
            .and_then(|a| json::find_member(a, "bot").and_then(|at| json::read_bool(a, at)))
            .unwrap_or(false);
        if from_bot {
            debug!(channel = CHANNEL, id = %id, "Bot message skipped");
            continue;
        }
        let mut msg = Inbound {
            id,
            sender: author.map(|a| string_id(a, "id")).unwrap_or_default(),
            chat: Identifier::new(),
            text: Text::new(),
        };
        if let Some(at) = json::find_member(message, "content") {
            let _ = json::read_string(message, at, &mut msg.text);
        }
        if fetched.batch.push(msg).is_err() {
            warn!(channel = CHANNEL, "Batch full, older message dropped");
            break;
        }
    }
    fetched
        .batch
        .sort_unstable_by(|a, b| snowflake_cmp(a.id.as_str(), b.id.as_str()));
    fetched
}

#[async_trait]
impl Poller for DiscordPoller {
    fn name(&self) -> &'static str {
        CHANNEL
    }

    async fn poll(&mut self, rt: &mut Runtime) -> PollOutcome {
        let channel = &rt.config.discord;
        let enabled = channel.enabled && !channel.token.is_empty() && !channel.channel_id.is_empty();
        if let Err(reason) = self.gate.open(enabled, rt.is_busy()) {
            return PollOutcome::Skipped(reason);
        }

        let mut auth = AuthHeader::new();
        let mut messages = ApiPath::new();
        if write!(auth, "Authorization: Bot {}\r\n", channel.token).is_err()
            || write!(messages, "/api/v10/channels/{}/messages", channel.channel_id).is_err()
        {
            return PollOutcome::Failed(too_large());
        }
        let since = rt.cursors.discord_last_id.clone();
        let mut listing = messages.clone();
        let query = if since.is_empty() {
            write!(listing, "?limit=1")
        } else {
            write!(listing, "?after={since}&limit={POLL_BATCH}")
        };
        if query.is_err() {
            return PollOutcome::Failed(too_large());
        }

        let status = rt
            .transport()
            .request(
                Route::Tls(Peer::Discord),
                &Request::get(DISCORD_HOST, &listing).with_headers(&auth),
            )
            .await;
        if !status.is_ok() {
            warn!(channel = CHANNEL, status = %status, body = %excerpt(rt.last_body()), "Poll failed");
            return PollOutcome::Failed(ChannelError::FetchFailed {
                channel: CHANNEL,
                status: status.as_i16(),
            });
        }

        let fetched = parse_messages(rt.last_body(), &since);
        if !fetched.newest.is_empty() {
            debug!(channel = CHANNEL, last_id = %fetched.newest, "Cursor advanced");
            rt.cursors.discord_last_id = fetched.newest;
            rt.persist();
        }
        if since.is_empty() {
            return PollOutcome::Primed;
        }
        if fetched.batch.is_empty() {
            return PollOutcome::Polled(Default::default());
        }

        let outbox = Outbox {
            peer: Peer::Discord,
            host: DISCORD_HOST,
            path: &messages,
            headers: &auth,
            max_chars: DISCORD_CHUNK,
        };
        let stats = answer_all(rt, |c| &c.discord, &fetched.batch, &outbox, |_| {
            Prefix::try_from("{\"content\":\"").map_err(|_| too_large())
        })
        .await;
        PollOutcome::Polled(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> Identifier {
        Identifier::parse(s).unwrap()
    }

    const LISTING: &str = r#"[
        {"id":"1300","content":"second","author":{"id":"5","username":"u"}},
        {"id":"1250","content":"echo","author":{"id":"77","bot":true}},
        {"id":"1200","content":"first","author":{"id":"5"},"referenced_message":{"id":"9999"}}
    ]"#;

    #[test]
    fn first_fetch_only_primes() {
        let fetched = parse_messages(LISTING, &Identifier::new());
        assert!(fetched.batch.is_empty());
        assert_eq!(fetched.newest.as_str(), "1300");
    }

    #[test]
    fn newer_messages_come_oldest_first_without_bots() {
        let fetched = parse_messages(LISTING, &id("1100"));
        let texts: Vec<_> = fetched.batch.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second"]);
        assert_eq!(fetched.batch[0].sender.as_str(), "5");
        assert_eq!(fetched.newest.as_str(), "1300");
    }

    #[test]
    fn seen_messages_are_ignored() {
        let fetched = parse_messages(LISTING, &id("1250"));
        assert_eq!(fetched.batch.len(), 1);
        assert_eq!(fetched.batch[0].id.as_str(), "1300");

        let fetched = parse_messages(LISTING, &id("1300"));
        assert!(fetched.batch.is_empty());
        assert!(fetched.newest.is_empty());
    }

    #[test]
    fn snowflake_length_beats_lexical_order() {
        let body = r#"[{"id":"10000","content":"a","author":{"id":"1"}}]"#;
        let fetched = parse_messages(body, &id("9999"));
        assert_eq!(fetched.batch.len(), 1);
    }

    #[test]
    fn bot_messages_still_move_the_cursor() {
        let body = r#"[{"id":"1400","content":"mine","author":{"id":"77","bot":true}}]"#;
        let fetched = parse_messages(body, &id("1300"));
        assert!(fetched.batch.is_empty());
        assert_eq!(fetched.newest.as_str(), "1400");
    }

    #[test]
    fn overlong_ids_are_never_newer() {
        let long = "9".repeat(40);
        let body = format!(r#"[{{"id":"{long}","content":"x","author":{{"id":"1"}}}}]"#);
        let fetched = parse_messages(&body, &id("1"));
        assert!(fetched.batch.is_empty());
        assert!(fetched.newest.is_empty());
    }

    #[test]
    fn missing_author_leaves_sender_unknown() {
        let body = r#"[{"id":"2","content":"x"}]"#;
        let fetched = parse_messages(body, &id("1"));
        assert!(fetched.batch[0].sender.is_empty());
    }

    #[test]
    fn error_object_yields_nothing() {
        let fetched = parse_messages(r#"{"message":"Missing Access","code":50001}"#, &id("1"));
        assert!(fetched.batch.is_empty());
        assert!(fetched.newest.is_empty());
    }
}
