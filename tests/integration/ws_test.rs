//! Integration tests for the queue protocol over a real WebSocket.

mod helpers;

use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use http::StatusCode;
use serde_json::json;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use helpers::{TIER, TestApp, WITH_MERCH_PRICE};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn connect(addr: SocketAddr, tier: &str) -> Socket {
    let (socket, _) = connect_async(format!("ws://{addr}/ws/{tier}"))
        .await
        .expect("WebSocket handshake failed");
    socket
}

async fn send(socket: &mut Socket, frame: &str) {
    socket
        .send(Message::text(frame.to_string()))
        .await
        .expect("Failed to send frame");
}

/// Next text frame, or `None` once the server closed the connection.
async fn next_text(socket: &mut Socket) -> Option<String> {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("Timed out waiting for a frame");
        match frame {
            Some(Ok(Message::Text(text))) => return Some(text.as_str().to_owned()),
            Some(Ok(Message::Close(_))) | None | Some(Err(_)) => return None,
            Some(Ok(_)) => continue,
        }
    }
}

/// Reads until `expected`, returning the frames seen before it.
async fn expect_frame(socket: &mut Socket, expected: &str) -> Vec<String> {
    let mut seen = Vec::new();
    loop {
        match next_text(socket).await {
            Some(frame) if frame == expected => return seen,
            Some(frame) => seen.push(frame),
            None => panic!("Connection closed before '{expected}', saw {seen:?}"),
        }
    }
}

async fn authenticate(app: &TestApp, socket: &mut Socket, user: &str) {
    send(socket, &format!("TOKEN {}", app.token(user))).await;
    assert_eq!(
        next_text(socket).await.as_deref(),
        Some("authentication successful")
    );
}

#[tokio::test]
async fn test_ws_unknown_tier_rejected() {
    let app = TestApp::new().await;
    let addr = app.spawn_server().await;

    let result = connect_async(format!("ws://{addr}/ws/vip")).await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_ws_bad_frames_before_auth() {
    let app = TestApp::new().await;
    let addr = app.spawn_server().await;
    let mut socket = connect(addr, TIER).await;

    send(&mut socket, "TOKEN").await;
    assert_eq!(next_text(&mut socket).await.as_deref(), Some("bad request"));

    send(&mut socket, "HELLO").await;
    assert_eq!(next_text(&mut socket).await.as_deref(), Some("invalid command"));

    send(&mut socket, "TOKEN forged").await;
    assert_eq!(next_text(&mut socket).await.as_deref(), Some("invalid token"));

    authenticate(&app, &mut socket, "alice").await;
}

#[tokio::test]
async fn test_ws_purchase_flow() {
    let app = TestApp::new().await;
    let addr = app.spawn_server().await;
    let mut socket = connect(addr, TIER).await;

    authenticate(&app, &mut socket, "alice").await;
    expect_frame(&mut socket, "proceed transaction").await;

    send(&mut socket, "MERCH 1").await;
    expect_frame(&mut socket, "M=6 | N=13").await;
    expect_frame(&mut socket, &format!("PAYMENT CODE {WITH_MERCH_PRICE}")).await;

    let response = app
        .request(
            "POST",
            &format!("/api/queue/{TIER}/complete"),
            Some(json!({ "with_merch": true })),
            Some(&app.token("alice")),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    expect_frame(&mut socket, "transaction successful").await;
    assert_eq!(next_text(&mut socket).await, None);
}

#[tokio::test]
async fn test_ws_same_identity_rejected() {
    let app = TestApp::new().await;
    let addr = app.spawn_server().await;

    let mut first = connect(addr, TIER).await;
    authenticate(&app, &mut first, "alice").await;
    expect_frame(&mut first, "proceed transaction").await;

    let mut second = connect(addr, TIER).await;
    authenticate(&app, &mut second, "alice").await;
    assert_eq!(
        next_text(&mut second).await.as_deref(),
        Some("already in queue")
    );
    assert_eq!(next_text(&mut second).await, None);

    let status = app
        .request("GET", &format!("/api/queue/{TIER}/status"), None, None)
        .await;
    assert_eq!(status.body["data"]["transacting"], 1);
}

#[tokio::test]
async fn test_ws_waiter_admitted_when_slot_frees() {
    let app = TestApp::with_capacity(7, 13, 1).await;
    let addr = app.spawn_server().await;

    let mut alice = connect(addr, TIER).await;
    authenticate(&app, &mut alice, "alice").await;
    expect_frame(&mut alice, "proceed transaction").await;

    let mut bob = connect(addr, TIER).await;
    authenticate(&app, &mut bob, "bob").await;
    assert_eq!(
        next_text(&mut bob).await.as_deref(),
        Some("WAITING QUEUE 1")
    );

    alice.close(None).await.expect("Failed to close");

    expect_frame(&mut bob, "proceed transaction").await;
}
