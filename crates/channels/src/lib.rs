//! Chat channel pollers for FemtoClaw.
//!
//! Each poller fetches what arrived since its cursor, hands accepted
//! messages to the agent and posts the reply back. Pollers are driven one
//! after another by the scheduler; none of them holds state across polls
//! other than its rate-limit gate.
//!
//! Available channels:
//! - **Telegram**: Bot API `getUpdates` / `sendMessage`
//! - **Discord**: REST channel messages, first fetch primes the cursor

pub mod chunk;
pub mod discord;
pub mod poller;
pub mod telegram;

pub use chunk::{Chunks, chunks};
pub use discord::{DISCORD_HOST, DiscordPoller};
pub use poller::{Batch, Inbound, PollOutcome, PollStats, Poller, SkipReason};
pub use telegram::{TELEGRAM_HOST, TelegramPoller};
