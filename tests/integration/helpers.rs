//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use ticketqueue_api::{AppState, build_app, build_state};
use ticketqueue_auth::JwtEncoder;
use ticketqueue_core::config::{
    AppConfig, InventoryConfig, PoolSeed, QueueConfig, QuoteConfig, TierConfig,
};
use ticketqueue_core::types::PoolId;
use ticketqueue_inventory::MemoryInventory;
use ticketqueue_realtime::connection::MemoryClient;

/// Tier every test app governs.
pub const TIER: &str = "early-bird";

/// Base price of the with-merch pool.
pub const WITH_MERCH_PRICE: i64 = 200;

/// Base price of the no-merch pool.
pub const NO_MERCH_PRICE: i64 = 100;

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Shared state behind the router
    pub state: AppState,
    /// Application config
    pub config: AppConfig,
    encoder: JwtEncoder,
}

impl TestApp {
    /// One tier with 7 merch and 13 plain units, at most 4 concurrent buyers.
    pub async fn new() -> Self {
        Self::with_capacity(7, 13, 4).await
    }

    /// One tier with the given pool capacities and slot ceiling.
    pub async fn with_capacity(with_merch: i64, no_merch: i64, max_transaction: usize) -> Self {
        let with_merch_pool = PoolId::new();
        let no_merch_pool = PoolId::new();

        let queue = QueueConfig {
            auth_timeout_seconds: 5,
            transaction_timeout_seconds: 30,
            quote: QuoteConfig {
                strategy: "base".to_string(),
                jitter_spread: 1,
            },
            tiers: vec![TierConfig {
                slug: TIER.to_string(),
                name: "Early Bird".to_string(),
                with_merch_pool,
                no_merch_pool,
                max_transaction,
            }],
        };
        let inventory = InventoryConfig {
            pools: vec![
                PoolSeed {
                    id: with_merch_pool,
                    name: "Early Bird with merchandise bundle".to_string(),
                    capacity: with_merch,
                    registered: 0,
                    price: WITH_MERCH_PRICE,
                },
                PoolSeed {
                    id: no_merch_pool,
                    name: "Early Bird without merchandise bundle".to_string(),
                    capacity: no_merch,
                    registered: 0,
                    price: NO_MERCH_PRICE,
                },
            ],
            ..InventoryConfig::default()
        };
        let config = AppConfig {
            queue,
            inventory,
            ..AppConfig::default()
        };

        let state = build_state(config.clone())
            .await
            .expect("Failed to build state");
        let router = build_app(state.clone(), &config.server.cors);
        let encoder = JwtEncoder::new(&config.auth);

        Self {
            router,
            state,
            config,
            encoder,
        }
    }

    /// A valid bearer token for `user`.
    pub fn token(&self, user: &str) -> String {
        self.encoder
            .issue(user, "user")
            .expect("Failed to issue token")
            .token
    }

    /// The tier's pools: `(with_merch, no_merch)`.
    pub fn pools(&self) -> (PoolId, PoolId) {
        let tier = &self.config.queue.tiers[0];
        (tier.with_merch_pool, tier.no_merch_pool)
    }

    /// The memory inventory behind the engine.
    pub fn memory(&self) -> &MemoryInventory {
        self.state
            .inventory
            .memory()
            .expect("Test app uses the memory provider")
    }

    /// Serves the router on an ephemeral local port.
    pub async fn spawn_server(&self) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("No local addr");
        let router = self.router.clone();
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server failed");
        });
        addr
    }

    /// Make an HTTP request to the test app
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json");

        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }

        let req = req
            .body(Body::from(body_str))
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status
    pub status: StatusCode,
    /// Parsed JSON body, `Null` when the body is not JSON
    pub body: Value,
}

/// Reads frames from an in-memory client until `expected` arrives, returning
/// everything seen before it. Panics if the connection closes first.
pub async fn read_until(client: &mut MemoryClient, expected: &str) -> Vec<String> {
    let mut seen = Vec::new();
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), client.recv())
            .await
            .expect("Timed out waiting for a frame");
        match frame {
            Some(frame) if frame == expected => return seen,
            Some(frame) => seen.push(frame),
            None => panic!("Connection closed before '{expected}', saw {seen:?}"),
        }
    }
}
