//! Line-oriented command interpreter for the local console.
//!
//! Every command returns the text to print. Config changes are saved
//! immediately; a failed save is reported but the change stays in memory.

use femtoclaw_agent::Runtime;
use femtoclaw_config::{ChannelConfig, Config};
use femtoclaw_core::bounded::Text;
use femtoclaw_core::json::escape_into;
use femtoclaw_core::limits::TOOL_ARGS_CAP;
use femtoclaw_providers::{Endpoint, Scheme};
use std::fmt::Write;

const HELP: &str = "\
Commands:
  help | ?                 This text
  status                   Device, network and channel status
  show config              Configuration with secrets hidden
  wifi <ssid> <password>   Store network credentials
  set <key> <value>        Change one setting (see keys below)
  tg token <token>         Telegram bot token
  tg allow <id>|list|clear Telegram sender allow list
  tg enable|disable
  dc token <token>         Discord bot token
  dc channel <id>          Discord channel to watch
  dc allow <id>|list|clear Discord sender allow list
  dc enable|disable
  diag                     Show how the model endpoint is reached
  chat <message>           Talk to the agent
  reset session            Forget the conversation";

/// Runs one console line.
pub async fn execute(rt: &mut Runtime, line: &str) -> String {
    let line = line.trim();
    let (cmd, rest) = split_word(line);
    match cmd {
        "" => String::new(),
        "help" | "?" => format!("{HELP}\nKeys: {}", Config::KEYS.join(", ")),
        "status" => status(rt),
        "show" if rest == "config" => show_config(&rt.config),
        "wifi" => wifi(rt, rest),
        "set" => set(rt, rest),
        "tg" => channel(rt, Channel::Telegram, rest),
        "dc" => channel(rt, Channel::Discord, rest),
        "diag" => diag(&rt.config),
        "chat" if !rest.is_empty() => chat(rt, rest).await,
        "reset" if rest == "session" => {
            rt.clear_session();
            "Session cleared.".into()
        }
        _ => format!("Unknown command: {line}  (type 'help')"),
    }
}

fn split_word(s: &str) -> (&str, &str) {
    match s.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (s, ""),
    }
}

fn yes_no(set: bool) -> &'static str {
    if set { "set" } else { "none" }
}

/// Status block shared with `femtoclaw status`.
pub fn status(rt: &Runtime) -> String {
    let platform = rt.platform();
    let net = platform.network();
    let config = &rt.config;
    let mut out = String::new();
    let _ = writeln!(out, "  Board     : {}", platform.board());
    if net.connected {
        let _ = writeln!(out, "  Network   : {} (connected)", net.ssid);
        let _ = writeln!(out, "  IP        : {}  RSSI {} dBm", net.ip, net.rssi);
    } else {
        let _ = writeln!(out, "  Network   : not connected");
    }
    let _ = writeln!(out, "  Provider  : {}  Model: {}", config.llm.provider, config.llm.model);
    let _ = writeln!(
        out,
        "  Telegram  : {}  token: {}  allow: {}",
        enabled(&config.telegram),
        yes_no(!config.telegram.token.is_empty()),
        config.telegram.allow_from.len()
    );
    let _ = writeln!(
        out,
        "  Discord   : {}  token: {}  channel: {}  allow: {}",
        enabled(&config.discord),
        yes_no(!config.discord.token.is_empty()),
        if config.discord.channel_id.is_empty() { "none" } else { config.discord.channel_id.as_str() },
        config.discord.allow_from.len()
    );
    let _ = writeln!(out, "  TG offset : {}", rt.cursors.telegram_offset);
    let _ = writeln!(out, "  DC last id: {}", rt.cursors.discord_last_id.as_str());
    let _ = writeln!(out, "  Session   : {} bytes", rt.session.len());
    let _ = write!(out, "  Uptime    : {}s", platform.uptime_ms() / 1000);
    out
}

fn enabled(channel: &ChannelConfig) -> &'static str {
    if channel.enabled { "ENABLED" } else { "disabled" }
}

fn show_config(config: &Config) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "  wifi_ssid      : {}", config.wifi.ssid);
    let _ = writeln!(out, "  wifi_pass      : {}", yes_no(!config.wifi.pass.is_empty()));
    let _ = writeln!(out, "  llm_provider   : {}", config.llm.provider);
    let _ = writeln!(out, "  llm_api_base   : {}", config.llm.api_base);
    let _ = writeln!(out, "  llm_api_key    : {}", yes_no(!config.llm.api_key.is_empty()));
    let _ = writeln!(out, "  llm_model      : {}", config.llm.model);
    let _ = writeln!(out, "  max_tokens     : {}", config.llm.max_tokens);
    let _ = writeln!(out, "  temperature    : {:.2}", config.llm.temperature);
    let _ = writeln!(out, "  system_prompt  : {} bytes", config.llm.system_prompt.len());
    let _ = writeln!(out, "  max_tool_iters : {}", config.agent.max_tool_iters);
    let _ = writeln!(out, "  heartbeat_ms   : {}", config.agent.heartbeat_ms);
    let _ = writeln!(out, "  tg_token       : {}", yes_no(!config.telegram.token.is_empty()));
    let _ = writeln!(out, "  dc_token       : {}", yes_no(!config.discord.token.is_empty()));
    let _ = write!(out, "  dc_channel_id  : {}", config.discord.channel_id.as_str());
    out
}

/// Saves and appends a note when the store refused.
fn saved(rt: &mut Runtime, message: impl Into<String>) -> String {
    let mut message = message.into();
    if let Err(e) = rt.save() {
        let _ = write!(message, " (not saved: {e})");
    }
    message
}

fn wifi(rt: &mut Runtime, args: &str) -> String {
    let (ssid, pass) = split_word(args);
    if ssid.is_empty() {
        return "Usage: wifi <ssid> <password>".into();
    }
    let previous = rt.config.wifi.clone();
    if let Err(e) = rt.config.set("wifi_ssid", ssid).and_then(|()| rt.config.set("wifi_pass", pass)) {
        rt.config.wifi = previous;
        return format!("[!] {e}");
    }
    saved(rt, "Saved. Credentials apply on the next connect.")
}

/// `set <key> <value>` goes through the `set_config` tool so the console
/// and the model change settings the same way.
fn set(rt: &mut Runtime, args: &str) -> String {
    let (key, value) = split_word(args);
    if key.is_empty() {
        return format!("Usage: set <key> <value>\nKeys: {}", Config::KEYS.join(", "));
    }
    let mut json: Text<TOOL_ARGS_CAP> = Text::new();
    let fitted = json.push_str("{\"key\":\"").is_ok()
        && escape_into(key, &mut json)
        && json.push_str("\",\"value\":\"").is_ok()
        && escape_into(value, &mut json)
        && json.push_str("\"}").is_ok();
    if !fitted {
        return format!("set {key} failed: value too long");
    }
    rt.run_tool("set_config", &json).as_str().to_owned()
}

#[derive(Debug, Clone, Copy)]
enum Channel {
    Telegram,
    Discord,
}

impl Channel {
    fn label(self) -> &'static str {
        match self {
            Self::Telegram => "Telegram",
            Self::Discord => "Discord",
        }
    }

    fn command(self) -> &'static str {
        match self {
            Self::Telegram => "tg",
            Self::Discord => "dc",
        }
    }

    fn token_key(self) -> &'static str {
        match self {
            Self::Telegram => "tg_token",
            Self::Discord => "dc_token",
        }
    }

    fn config(self, config: &mut Config) -> &mut ChannelConfig {
        match self {
            Self::Telegram => &mut config.telegram,
            Self::Discord => &mut config.discord,
        }
    }
}

fn channel(rt: &mut Runtime, which: Channel, args: &str) -> String {
    let label = which.label();
    let (sub, rest) = split_word(args);
    match (sub, which) {
        ("token", _) if !rest.is_empty() => match rt.config.set(which.token_key(), rest) {
            Ok(()) => saved(rt, format!("{label} token saved.")),
            Err(e) => format!("[!] {e}"),
        },
        ("channel", Channel::Discord) if !rest.is_empty() => match rt.config.set("dc_channel_id", rest) {
            Ok(()) => saved(rt, format!("Discord channel: {rest}")),
            Err(e) => format!("[!] {e}"),
        },
        ("allow", _) => allow(rt, which, rest),
        ("enable", _) => {
            which.config(&mut rt.config).enabled = true;
            saved(rt, format!("{label} enabled."))
        }
        ("disable", _) => {
            which.config(&mut rt.config).enabled = false;
            saved(rt, format!("{label} disabled."))
        }
        (_, Channel::Telegram) => "Usage: tg token <t> | tg allow <id>|list|clear | tg enable|disable".into(),
        (_, Channel::Discord) => {
            "Usage: dc token <t> | dc channel <id> | dc allow <id>|list|clear | dc enable|disable".into()
        }
    }
}

fn allow(rt: &mut Runtime, which: Channel, arg: &str) -> String {
    let label = which.label();
    let list = &mut which.config(&mut rt.config).allow_from;
    match arg {
        "" => format!("Usage: {} allow <id>|list|clear", which.command()),
        "list" if list.is_empty() => "(empty, all users accepted)".into(),
        "list" => list.iter().map(|id| format!("  {}", id.as_str())).collect::<Vec<_>>().join("\n"),
        "clear" => {
            list.clear();
            saved(rt, format!("{label} allow list cleared (all users now accepted)."))
        }
        id => match list.add(id) {
            Ok(()) => saved(rt, format!("Added {label} allow: {id}")),
            Err(e) => format!("[!] {e}"),
        },
    }
}

fn diag(config: &Config) -> String {
    let base = config.llm.api_base.as_str();
    let endpoint = match Endpoint::parse(base) {
        Ok(endpoint) => endpoint,
        Err(e) => return format!("  api_base : {base}\n  [!] {e}"),
    };
    let path = match endpoint.completions_path() {
        Ok(path) => path,
        Err(e) => return format!("  api_base : {base}\n  [!] {e}"),
    };
    let scheme = match endpoint.scheme {
        Scheme::Http => "HTTP (plain)",
        Scheme::Https => "HTTPS (TLS)",
    };
    format!(
        "  api_base : {base}\n  host     : {}\n  port     : {}\n  path     : {path}\n  scheme   : {scheme}",
        endpoint.host, endpoint.port
    )
}

async fn chat(rt: &mut Runtime, message: &str) -> String {
    if rt.is_busy() {
        return "[!] Network busy, try again shortly.".into();
    }
    if !rt.platform().network().connected {
        return "[!] Not connected.".into();
    }
    let outcome = rt.chat(message).await;
    format!("[femtoclaw] {}", outcome.reply)
}
