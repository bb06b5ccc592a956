//! Agent loop scenarios with a scripted model and, at the end, the real
//! client over a scripted connection.

use std::sync::Arc;

use femtoclaw_agent::Runtime;
use femtoclaw_agent::testing::ScriptedModel;
use femtoclaw_config::{Config, Cursors, MemoryStore};
use femtoclaw_core::bounded::Text;
use femtoclaw_core::error::ProviderError;
use femtoclaw_core::platform::StubPlatform;
use femtoclaw_transport::{ScriptedConnection, Transport};

fn runtime_with(config: Config) -> (Runtime, MemoryStore, Arc<StubPlatform>) {
    let store = MemoryStore::new();
    let platform = Arc::new(StubPlatform::online("lab", "10.0.0.2", -50));
    let runtime = Runtime::new(
        config,
        Cursors::default(),
        Box::new(store.clone()),
        platform.clone(),
        Transport::new(),
    );
    (runtime, store, platform)
}

fn config_with_iters(iters: u8) -> Config {
    let mut config = Config::default();
    config.agent.max_tool_iters = iters;
    config
}

// ── Plain replies ────────────────────────────────────────────────────────

#[tokio::test]
async fn plain_reply_is_final_and_recorded() {
    let (mut rt, _, _) = runtime_with(Config::default());
    let mut model = ScriptedModel::new().reply("hello back");

    let out = rt.chat_with(&mut model, "hello").await;

    assert_eq!(out.reply.as_str(), "hello back");
    assert_eq!((out.model_calls, out.tool_calls, out.failed), (1, 0, false));
    let turns: Vec<_> = rt.session.turns().map(|t| (t.role.to_owned(), t.content.to_owned())).collect();
    assert_eq!(
        turns,
        vec![
            ("user".to_owned(), "hello".to_owned()),
            ("assistant".to_owned(), "hello back".to_owned()),
        ]
    );
}

#[tokio::test]
async fn history_grows_across_runs() {
    let (mut rt, _, _) = runtime_with(Config::default());
    let mut model = ScriptedModel::new().reply("one").reply("two");
    rt.chat_with(&mut model, "first").await;
    rt.chat_with(&mut model, "second").await;
    assert_eq!(model.history_turns, vec![0, 2]);
}

// ── Tool calls ───────────────────────────────────────────────────────────

#[tokio::test]
async fn tool_result_feeds_next_prompt() {
    let (mut rt, _, _) = runtime_with(Config::default());
    let mut model = ScriptedModel::new()
        .reply("<tool:get_wifi_info>{}</tool>")
        .reply("You are on lab.");

    let out = rt.chat_with(&mut model, "which network?").await;

    assert_eq!(out.reply.as_str(), "You are on lab.");
    assert_eq!(out.tool_calls, 1);
    assert_eq!(model.prompts[0], "which network?");
    assert!(model.prompts[1].starts_with("[Tool get_wifi_info]: {\"ssid\":\"lab\""));
    let users: Vec<_> = rt
        .session
        .turns()
        .filter(|t| t.role == "user")
        .map(|t| t.content.to_owned())
        .collect();
    assert_eq!(users, vec!["which network?", "[tool_result]"]);
}

#[tokio::test]
async fn tool_is_invoked_exactly_budget_times() {
    let (mut rt, _, platform) = runtime_with(config_with_iters(3));
    let mut model = ScriptedModel::new().reply(r#"again <tool:message>{"text":"ping"}</tool>"#);

    let out = rt.chat_with(&mut model, "loop forever").await;

    assert_eq!(model.calls(), 3);
    assert_eq!(out.tool_calls, 3);
    assert_eq!(platform.announced().len(), 3);
    assert_eq!(out.reply.as_str(), r#"again <tool:message>{"text":"ping"}</tool>"#);
}

#[tokio::test]
async fn zero_budget_still_calls_model_once() {
    let (mut rt, _, _) = runtime_with(config_with_iters(0));
    let mut model = ScriptedModel::new().reply("ok");
    let out = rt.chat_with(&mut model, "hi").await;
    assert_eq!(model.calls(), 1);
    assert_eq!(out.reply.as_str(), "ok");
}

#[tokio::test]
async fn unknown_tool_result_goes_back_to_model() {
    let (mut rt, _, _) = runtime_with(Config::default());
    let mut model = ScriptedModel::new().reply("<tool:teleport>{}</tool>").reply("cannot");
    rt.chat_with(&mut model, "go").await;
    assert_eq!(model.prompts[1], "[Tool teleport]: [tool teleport not available]");
}

#[tokio::test]
async fn set_config_tool_persists_through_store() {
    let (mut rt, store, _) = runtime_with(Config::default());
    let mut model = ScriptedModel::new()
        .reply(r#"<tool:set_config>{"key":"llm_model","value":"tiny-1b"}</tool>"#)
        .reply("Switched.");

    rt.chat_with(&mut model, "use tiny-1b").await;

    assert_eq!(rt.config.llm.model.as_str(), "tiny-1b");
    let (saved, _) = store.snapshot().unwrap();
    assert_eq!(saved.llm.model.as_str(), "tiny-1b");
}

#[tokio::test]
async fn reset_session_tool_clears_then_records_exchange() {
    let (mut rt, _, _) = runtime_with(Config::default());
    rt.session.append("user", "old");
    let mut model = ScriptedModel::new().reply("<tool:reset_session></tool>").reply("fresh");
    rt.chat_with(&mut model, "forget").await;
    let contents: Vec<_> = rt.session.turns().map(|t| t.content.to_owned()).collect();
    assert_eq!(contents, vec!["[tool_result]", "fresh"]);
}

// ── Failures ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn model_failure_ends_loop_with_diagnostic() {
    let (mut rt, _, _) = runtime_with(Config::default());
    let mut model = ScriptedModel::new().reply("<tool:get_time></tool>").fail(ProviderError::Http {
        status: 503,
        excerpt: Text::try_from("upstream down").unwrap(),
    });

    let out = rt.chat_with(&mut model, "time?").await;

    assert!(out.failed);
    assert_eq!(out.reply.as_str(), "[LLM 503] upstream down");
    assert_eq!(out.tool_calls, 1);
    assert_eq!(rt.session.turns().count(), 2);
}

// ── Real client ──────────────────────────────────────────────────────────

#[tokio::test]
async fn runtime_chat_uses_transport() {
    let script = ScriptedConnection::new();
    let body = r#"{"choices":[{"message":{"content":"hi there"}}]}"#;
    script.respond(format!("HTTP/1.1 200 OK\r\nContent-Length: {}\r\n\r\n{body}", body.len()));
    let mut rt = Runtime::new(
        Config::default(),
        Cursors::default(),
        Box::new(MemoryStore::new()),
        Arc::new(StubPlatform::new()),
        script.transport(),
    );

    let out = rt.chat("hello").await;

    assert_eq!(out.reply.as_str(), "hi there");
    assert!(!rt.is_busy());
    assert_eq!(script.connects().len(), 1);
}
