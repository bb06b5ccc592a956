//! LM client against scripted HTTP responses.

use femtoclaw_core::bounded::{JsonBuf, Text};
use femtoclaw_core::provider::{ChatModel, ChatRequest, LlmSettings, Reply, ReplySource};
use femtoclaw_core::session::Session;
use femtoclaw_providers::LlmClient;
use femtoclaw_transport::ScriptedConnection;

fn ok_response(json: &str) -> String {
    format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{json}",
        json.len()
    )
}

async fn chat(script: &ScriptedConnection, settings: &LlmSettings, prompt: &str) -> (Result<ReplySource, String>, Reply) {
    let mut transport = script.transport();
    let mut body = JsonBuf::new();
    let history = Session::new();
    let mut client = LlmClient::new(&mut transport, &mut body);
    let mut reply = Reply::new();
    let result = client
        .complete(
            ChatRequest {
                settings,
                history: &history,
                prompt,
            },
            &mut reply,
        )
        .await
        .map_err(|e| e.to_string());
    (result, reply)
}

#[tokio::test]
async fn content_reply() {
    let script = ScriptedConnection::new();
    script.respond(ok_response(r#"{"choices":[{"message":{"content":"hi there"}}]}"#));
    let (result, reply) = chat(&script, &LlmSettings::default(), "hello").await;
    assert_eq!(result, Ok(ReplySource::Content));
    assert_eq!(reply.as_str(), "hi there");
}

#[tokio::test]
async fn reasoning_reply_when_content_empty() {
    let script = ScriptedConnection::new();
    script.respond(ok_response(
        r#"{"choices":[{"message":{"content":"","reasoning":"thinking..."}}]}"#,
    ));
    let (result, reply) = chat(&script, &LlmSettings::default(), "hello").await;
    assert_eq!(result, Ok(ReplySource::Reasoning));
    assert_eq!(reply.as_str(), "thinking...");
}

#[tokio::test]
async fn rate_limit_diagnostic_carries_status() {
    let script = ScriptedConnection::new();
    script.respond("HTTP/1.1 429 Too Many Requests\r\n\r\n{\"error\":\"rate limited\"}");
    let (result, reply) = chat(&script, &LlmSettings::default(), "hello").await;
    let diagnostic = result.unwrap_err();
    assert!(diagnostic.contains("429"), "{diagnostic}");
    assert!(diagnostic.contains("rate limited"));
    assert!(reply.is_empty());
}

#[tokio::test]
async fn connect_failure_is_negative_status() {
    let script = ScriptedConnection::new();
    script.refuse_next();
    let (result, _) = chat(&script, &LlmSettings::default(), "hello").await;
    assert_eq!(result.unwrap_err(), "[LLM -1] ");
}

#[tokio::test]
async fn request_framing_over_tls() {
    let script = ScriptedConnection::new();
    script.respond(ok_response(r#"{"choices":[{"message":{"content":"x"}}]}"#));
    let mut settings = LlmSettings::default();
    settings.api_key = Text::try_from("sk-test").unwrap();
    chat(&script, &settings, "ping").await.0.unwrap();

    assert_eq!(script.connects(), vec![("openrouter.ai".to_owned(), 443)]);
    let sent = &script.requests()[0];
    let (head, body) = sent.split_once("\r\n\r\n").unwrap();
    assert!(head.starts_with("POST /api/v1/chat/completions HTTP/1.1\r\n"));
    assert!(head.contains("Host: openrouter.ai\r\n"));
    assert!(head.contains("Authorization: Bearer sk-test\r\n"));
    assert!(head.contains(&format!("Content-Length: {}\r\n", body.len())));
    assert!(head.contains("Connection: close"));

    let v: serde_json::Value = serde_json::from_str(body).unwrap();
    assert_eq!(v["messages"].as_array().unwrap().last().unwrap()["content"], "ping");
}

#[tokio::test]
async fn plain_backend_uses_configured_port() {
    let script = ScriptedConnection::new();
    script.respond(ok_response(r#"{"choices":[{"message":{"content":"local"}}]}"#));
    let mut settings = LlmSettings::default();
    settings.api_base = Text::try_from("http://192.168.1.20:11434/v1").unwrap();
    let (result, reply) = chat(&script, &settings, "hi").await;

    assert!(result.is_ok());
    assert_eq!(reply.as_str(), "local");
    assert_eq!(script.connects(), vec![("192.168.1.20".to_owned(), 11434)]);
    assert_eq!(script.insecure_count(), 0);
    assert!(script.requests()[0].contains("Host: 192.168.1.20\r\n"));
}
