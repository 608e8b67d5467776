//! Shared helpers for integration tests: spawn the app on an ephemeral port.

#![allow(dead_code, clippy::unwrap_used)]

use std::net::SocketAddr;
use std::time::Duration;

use amm_ledger::api::build_app;
use amm_ledger::app_state::AppState;
use amm_ledger::domain::{AssetPair, EventBus, PoolEntry, PoolLedger};
use amm_ledger::service::PoolService;
use serde_json::{Value, json};

/// External identity of asset A in tests.
pub const ASSET_A: &str = "0xTokenA";
/// External identity of asset B in tests.
pub const ASSET_B: &str = "0xTokenB";

/// Starts a server with an empty zero-fee pool and returns its address.
pub async fn spawn_app() -> SocketAddr {
    let assets = AssetPair::new(ASSET_A, ASSET_B).unwrap();
    let entry = PoolEntry::new(PoolLedger::default(), assets.clone());
    let service = PoolService::new(entry, EventBus::new(1_024));
    let app = build_app(AppState::new(service, assets), Duration::from_secs(5));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Thin JSON client around `reqwest`.
#[derive(Debug, Clone)]
pub struct Api {
    base: String,
    client: reqwest::Client,
}

impl Api {
    /// Creates a client for the server at `addr`.
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            base: format!("http://{addr}"),
            client: reqwest::Client::new(),
        }
    }

    /// `GET path`, returning status and JSON body.
    pub async fn get(&self, path: &str) -> (u16, Value) {
        let resp = self
            .client
            .get(format!("{}{path}", self.base))
            .send()
            .await
            .unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap_or(Value::Null))
    }

    /// `POST path` with a JSON body, returning status and JSON body.
    pub async fn post(&self, path: &str, body: Value) -> (u16, Value) {
        let resp = self
            .client
            .post(format!("{}{path}", self.base))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap_or(Value::Null))
    }

    /// Credits `holder`'s escrow with `amount` of `asset`.
    pub async fn credit(&self, holder: &str, asset: &str, amount: u128) {
        let (status, _) = self
            .post(
                &format!("/api/v1/escrow/{holder}/credit"),
                json!({ "asset": asset, "amount": amount.to_string() }),
            )
            .await;
        assert_eq!(status, 200);
    }

    /// Credits both assets and deposits them.
    pub async fn fund_and_deposit(&self, holder: &str, a: u128, b: u128) -> Value {
        self.credit(holder, "A", a).await;
        self.credit(holder, "B", b).await;
        let (status, body) = self
            .post(
                "/api/v1/pool/deposit",
                json!({ "holder": holder, "amount_a": a.to_string(), "amount_b": b.to_string() }),
            )
            .await;
        assert_eq!(status, 200, "deposit failed: {body}");
        body
    }
}

/// Parses a string-encoded amount field.
pub fn amount(value: &Value) -> u128 {
    value.as_str().unwrap().parse().unwrap()
}
