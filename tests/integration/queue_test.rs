//! Integration tests for the queue HTTP endpoints.

mod helpers;

use http::StatusCode;
use serde_json::json;

use ticketqueue_core::traits::InventorySource;
use ticketqueue_realtime::connection::{MemoryClient, memory_pair};

use helpers::{TIER, TestApp, read_until};

/// Runs a queue connection for `user` over the in-memory transport and waits
/// until it holds a transaction slot.
async fn admitted_session(app: &TestApp, user: &str) -> MemoryClient {
    let handler = app.state.engine.handler(TIER).expect("tier exists");
    let (mut client, source, sink) = memory_pair();
    tokio::spawn(async move { handler.serve(source, sink).await });

    client.send(&format!("TOKEN {}", app.token(user)));
    read_until(&mut client, "authentication successful").await;
    read_until(&mut client, "proceed transaction").await;
    client
}

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new().await;

    let response = app.request("GET", "/api/health", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["status"], "ok");
    assert_eq!(response.body["data"]["tiers"], 1);
    assert_eq!(response.body["data"]["metrics"]["connections_opened"], 0);
}

#[tokio::test]
async fn test_status_unknown_tier_is_not_found() {
    let app = TestApp::new().await;

    let response = app.request("GET", "/api/queue/vip/status", None, None).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["error"], "NOT_FOUND");
}

#[tokio::test]
async fn test_status_reports_tier() {
    let app = TestApp::with_capacity(7, 13, 3).await;

    let response = app
        .request("GET", &format!("/api/queue/{TIER}/status"), None, None)
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let data = &response.body["data"];
    assert_eq!(data["tier"], TIER);
    assert_eq!(data["transacting"], 0);
    assert_eq!(data["waiting"], 0);
    assert_eq!(data["ceiling"], 3);
    assert_eq!(data["max_transaction"], 3);
    assert_eq!(data["with_merch"]["capacity"], 7);
}

#[tokio::test]
async fn test_complete_requires_token() {
    let app = TestApp::new().await;

    let response = app
        .request(
            "POST",
            &format!("/api/queue/{TIER}/complete"),
            Some(json!({ "with_merch": false })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = app
        .request(
            "POST",
            &format!("/api/queue/{TIER}/complete"),
            Some(json!({ "with_merch": false })),
            Some("not-a-jwt"),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_complete_without_slot_is_not_found() {
    let app = TestApp::new().await;
    let token = app.token("nobody");

    let response = app
        .request(
            "POST",
            &format!("/api/queue/{TIER}/complete"),
            Some(json!({ "with_merch": false })),
            Some(&token),
        )
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_complete_rejects_mismatched_variant() {
    let app = TestApp::new().await;
    let _client = admitted_session(&app, "alice").await;
    let token = app.token("alice");

    // Plain stock is available, so the session starts without merch.
    let response = app
        .request(
            "POST",
            &format!("/api/queue/{TIER}/complete"),
            Some(json!({ "with_merch": true })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);

    let status = app
        .request("GET", &format!("/api/queue/{TIER}/status"), None, None)
        .await;
    assert_eq!(status.body["data"]["transacting"], 1);
}

#[tokio::test]
async fn test_complete_finishes_session() {
    let app = TestApp::new().await;
    let mut client = admitted_session(&app, "alice").await;
    let token = app.token("alice");

    let response = app
        .request(
            "POST",
            &format!("/api/queue/{TIER}/complete"),
            Some(json!({ "with_merch": false })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["message"], "transaction successful");

    read_until(&mut client, "transaction successful").await;
    assert_eq!(client.recv().await, None);

    let (_, no_merch) = app.pools();
    let pool = app.memory().get_by_id(&no_merch).await.unwrap();
    assert_eq!(pool.registered, 1);

    let status = app
        .request("GET", &format!("/api/queue/{TIER}/status"), None, None)
        .await;
    assert_eq!(status.body["data"]["transacting"], 0);
    assert_eq!(status.body["data"]["metrics"]["sessions_completed"], 1);

    // The slot is gone, so a second completion finds nothing.
    let again = app
        .request(
            "POST",
            &format!("/api/queue/{TIER}/complete"),
            Some(json!({ "with_merch": false })),
            Some(&token),
        )
        .await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_complete_rejected_when_pool_sold_out() {
    let app = TestApp::new().await;
    let _client = admitted_session(&app, "alice").await;
    let (_, no_merch) = app.pools();
    app.memory().sell_out(&no_merch).unwrap();

    let response = app
        .request(
            "POST",
            &format!("/api/queue/{TIER}/complete"),
            Some(json!({ "with_merch": false })),
            Some(&app.token("alice")),
        )
        .await;

    assert_eq!(response.status, StatusCode::CONFLICT);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_completions_never_oversell() {
    let app = TestApp::with_capacity(5, 1, 2).await;
    let _alice = admitted_session(&app, "alice").await;
    let _bob = admitted_session(&app, "bob").await;
    let path = format!("/api/queue/{TIER}/complete");
    let alice_token = app.token("alice");
    let bob_token = app.token("bob");

    let (first, second) = tokio::join!(
        app.request(
            "POST",
            &path,
            Some(json!({ "with_merch": false })),
            Some(&alice_token),
        ),
        app.request(
            "POST",
            &path,
            Some(json!({ "with_merch": false })),
            Some(&bob_token),
        ),
    );

    let mut statuses = vec![first.status, second.status];
    statuses.sort();
    assert_eq!(statuses, vec![StatusCode::OK, StatusCode::CONFLICT]);

    let (_, no_merch) = app.pools();
    let pool = app.memory().get_by_id(&no_merch).await.unwrap();
    assert_eq!(pool.registered, pool.capacity);
}
