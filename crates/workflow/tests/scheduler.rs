//! Scheduler passes over a scripted network.

use std::sync::Arc;
use std::time::Duration;

use femtoclaw_agent::Runtime;
use femtoclaw_channels::{PollOutcome, SkipReason};
use femtoclaw_config::{Config, Cursors, MemoryStore};
use femtoclaw_core::bounded::Identifier;
use femtoclaw_core::platform::StubPlatform;
use femtoclaw_transport::ScriptedConnection;
use femtoclaw_workflow::{HEARTBEAT_PROMPT, Heartbeat, HeartbeatOutcome, Pass, Scheduler};

fn ok(body: &str) -> String {
    format!("HTTP/1.1 200 OK\r\nContent-Length: {}\r\n\r\n{body}", body.len())
}

fn runtime(config: Config, script: &ScriptedConnection, platform: StubPlatform) -> Runtime {
    Runtime::new(
        config,
        Cursors::default(),
        Box::new(MemoryStore::new()),
        Arc::new(platform),
        script.transport(),
    )
}

fn online() -> StubPlatform {
    StubPlatform::online("lab", "10.0.0.2", -60)
}

fn ran(pass: Pass) -> (Vec<(&'static str, PollOutcome)>, HeartbeatOutcome) {
    match pass {
        Pass::Ran { polls, heartbeat } => (polls, heartbeat),
        Pass::Busy => panic!("pass was skipped"),
    }
}

#[tokio::test(start_paused = true)]
async fn pass_runs_telegram_then_discord_then_heartbeat() {
    let script = ScriptedConnection::new();
    script.respond(ok(r#"{"ok":true,"result":[]}"#));
    script.respond(ok(r#"[{"id":"500","content":"x","author":{"id":"1"}}]"#));
    script.respond(ok(r#"{"choices":[{"message":{"content":"Up 2s on lab."}}]}"#));

    let mut config = Config::default();
    config.telegram.enabled = true;
    config.telegram.token = "T".try_into().unwrap();
    config.discord.enabled = true;
    config.discord.token = "D".try_into().unwrap();
    config.discord.channel_id = Identifier::parse("42").unwrap();
    config.agent.heartbeat_ms = 1000;
    let mut rt = runtime(config, &script, online());
    let mut scheduler = Scheduler::default();

    tokio::time::advance(Duration::from_secs(2)).await;
    let (polls, heartbeat) = ran(scheduler.run_once(&mut rt).await);

    assert_eq!(polls.len(), 2);
    assert_eq!(polls[0].0, "telegram");
    assert!(matches!(polls[0].1, PollOutcome::Polled(_)));
    assert_eq!(polls[1].0, "discord");
    assert!(matches!(polls[1].1, PollOutcome::Primed));
    assert_eq!(heartbeat, HeartbeatOutcome::Reported("Up 2s on lab.".try_into().unwrap()));

    let hosts: Vec<_> = script.connects().into_iter().map(|(h, _)| h).collect();
    assert_eq!(hosts, vec!["api.telegram.org", "discord.com", "openrouter.ai"]);
    assert!(script.requests()[2].contains(HEARTBEAT_PROMPT));
}

#[tokio::test(start_paused = true)]
async fn busy_network_skips_the_whole_pass() {
    let script = ScriptedConnection::new();
    let mut rt = runtime(Config::default(), &script, online());
    let flag = rt.busy_flag();
    let _guard = flag.try_acquire().unwrap();

    assert!(matches!(Scheduler::default().run_once(&mut rt).await, Pass::Busy));
}

#[tokio::test(start_paused = true)]
async fn disabled_channels_and_heartbeat_do_nothing() {
    let script = ScriptedConnection::new();
    let mut rt = runtime(Config::default(), &script, online());

    let (polls, heartbeat) = ran(Scheduler::default().run_once(&mut rt).await);

    assert!(polls
        .iter()
        .all(|(_, o)| matches!(o, PollOutcome::Skipped(SkipReason::Disabled))));
    assert_eq!(heartbeat, HeartbeatOutcome::Disabled);
    assert!(script.connects().is_empty());
}

#[tokio::test(start_paused = true)]
async fn heartbeat_waits_for_its_period() {
    let script = ScriptedConnection::new();
    script.respond(ok(r#"{"choices":[{"message":{"content":"fine"}}]}"#));
    let mut config = Config::default();
    config.agent.heartbeat_ms = 60_000;
    let mut rt = runtime(config, &script, online());
    let mut heartbeat = Heartbeat::new();

    assert_eq!(heartbeat.tick(&mut rt).await, HeartbeatOutcome::NotDue);
    tokio::time::advance(Duration::from_secs(60)).await;
    assert!(matches!(heartbeat.tick(&mut rt).await, HeartbeatOutcome::Reported(_)));
    assert_eq!(heartbeat.tick(&mut rt).await, HeartbeatOutcome::NotDue);
    assert_eq!(script.connects().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn heartbeat_skips_while_offline() {
    let script = ScriptedConnection::new();
    let mut config = Config::default();
    config.agent.heartbeat_ms = 10;
    let mut rt = runtime(config, &script, StubPlatform::new());
    let mut heartbeat = Heartbeat::new();

    tokio::time::advance(Duration::from_millis(10)).await;
    assert_eq!(heartbeat.tick(&mut rt).await, HeartbeatOutcome::Offline);
    assert!(script.connects().is_empty());
}
