//! Transport sequencing against the scripted connection.

use femtoclaw_transport::{HttpStatus, Peer, Request, Route, ScriptedConnection, Timeouts};
use std::time::Duration;

// ── Connection lifecycle ─────────────────────────────────────────────────

#[tokio::test]
async fn tls_request_resets_object_and_dials_443() {
    let script = ScriptedConnection::new();
    script.respond("HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\r\n{\"ok\":true}");
    let mut transport = script.transport();

    let status = transport
        .request(
            Route::Tls(Peer::Telegram),
            &Request::get("api.telegram.org", "/botT/getUpdates"),
        )
        .await;

    assert_eq!(status, HttpStatus::Code(200));
    assert_eq!(transport.body_text(), "{\"ok\":true}");
    assert_eq!(script.connects(), vec![("api.telegram.org".to_owned(), 443)]);
    assert_eq!(script.insecure_count(), 1);
    assert_eq!(script.closes(), 1);
    assert!(!transport.is_busy());
}

#[tokio::test]
async fn plain_request_uses_given_port_and_verifies_nothing() {
    let script = ScriptedConnection::new();
    script.respond("HTTP/1.0 200 OK\n\nplain");
    let mut transport = script.transport();

    let status = transport
        .request(
            Route::Plain { port: 8080 },
            &Request::post("10.0.0.5", "/v1/chat/completions", b"{}"),
        )
        .await;

    assert!(status.is_ok());
    assert_eq!(transport.body(), b"plain");
    assert_eq!(script.connects(), vec![("10.0.0.5".to_owned(), 8080)]);
    assert_eq!(script.insecure_count(), 0);
    let sent = &script.requests()[0];
    assert!(sent.contains("Host: 10.0.0.5\r\n"));
    assert!(sent.contains("Content-Length: 2\r\n"));
}

#[tokio::test]
async fn failed_connect_clears_previous_body() {
    let script = ScriptedConnection::new();
    script.respond("HTTP/1.1 200 OK\r\n\r\nfirst");
    script.refuse_next();
    let mut transport = script.transport();
    let req = Request::get("discord.com", "/api/v10/channels/1/messages");

    assert!(transport.request(Route::Tls(Peer::Discord), &req).await.is_ok());
    assert_eq!(transport.body(), b"first");

    let status = transport.request(Route::Tls(Peer::Discord), &req).await;
    assert_eq!(status, HttpStatus::ConnectFailed);
    assert_eq!(status.as_i16(), -1);
    assert!(transport.body().is_empty());
}

#[tokio::test]
async fn busy_flag_refuses_overlapping_request() {
    let script = ScriptedConnection::new();
    script.respond("HTTP/1.1 200 OK\r\n\r\nunused");
    let mut transport = script.transport();
    let observer = transport.busy_flag();

    let guard = observer.try_acquire().unwrap();
    let status = transport
        .request(Route::Tls(Peer::Llm), &Request::get("h", "/"))
        .await;
    assert_eq!(status, HttpStatus::Busy);
    assert!(script.connects().is_empty());
    assert_eq!(script.pending(), 1);

    drop(guard);
    let status = transport
        .request(Route::Tls(Peer::Llm), &Request::get("h", "/"))
        .await;
    assert!(status.is_ok());
}

// ── Response decoding ────────────────────────────────────────────────────

#[tokio::test]
async fn chunked_error_body_is_decoded() {
    let script = ScriptedConnection::new();
    script.respond_fragments(&[
        b"HTTP/1.1 429 Too Many Requests\r\nTransfer-Encoding: chunked\r\n\r\n",
        b"12\r\n{\"error\":\"slow\"}\r\n\r\n",
        b"0\r\n\r\n",
    ]);
    let mut transport = script.transport();

    let status = transport
        .request(Route::Tls(Peer::Llm), &Request::post("api.example", "/x", b"{}"))
        .await;
    assert_eq!(status, HttpStatus::Code(429));
    assert_eq!(status.to_string(), "429");
    assert_eq!(transport.body_text(), "{\"error\":\"slow\"}\r\n");
}

#[tokio::test(start_paused = true)]
async fn stalled_body_returns_partial_data_at_deadline() {
    let script = ScriptedConnection::new();
    script.respond_then_hang("HTTP/1.1 200 OK\r\n\r\n{\"partial\":");
    let mut transport = script
        .transport()
        .with_timeouts(Timeouts::uniform(Duration::from_secs(2)));

    let started = tokio::time::Instant::now();
    let status = transport
        .request(Route::Tls(Peer::Llm), &Request::get("h", "/"))
        .await;
    assert!(status.is_ok());
    assert_eq!(transport.body_text(), "{\"partial\":");
    assert!(started.elapsed() >= Duration::from_secs(2));
    assert_eq!(script.closes(), 1);
}
