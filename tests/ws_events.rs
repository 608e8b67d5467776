//! WebSocket integration tests: subscriptions and live event delivery.

#![allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::panic)]

mod common;

use std::net::SocketAddr;
use std::time::Duration;

use common::{Api, spawn_app};
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn connect(addr: SocketAddr) -> Ws {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws"))
        .await
        .unwrap();
    ws
}

async fn send_command(ws: &mut Ws, id: &str, payload: Value) {
    let msg = json!({
        "id": id,
        "type": "command",
        "timestamp": chrono::Utc::now(),
        "payload": payload,
    });
    ws.send(Message::text(msg.to_string())).await.unwrap();
}

async fn next_json(ws: &mut Ws) -> Value {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .unwrap_or_else(|_| panic!("timed out waiting for ws message"))
            .unwrap()
            .unwrap();
        if let Message::Text(text) = frame {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

/// Reads until an event with `event_type` arrives.
async fn next_event(ws: &mut Ws, event_type: &str) -> Value {
    loop {
        let msg = next_json(ws).await;
        if msg["type"] == "event" && msg["payload"]["event_type"] == event_type {
            return msg["payload"].clone();
        }
    }
}

#[tokio::test]
async fn subscribed_client_receives_swap_events() {
    let addr = spawn_app().await;
    let api = Api::new(addr);
    let mut ws = connect(addr).await;

    send_command(
        &mut ws,
        "sub-1",
        json!({ "command": "subscribe", "topics": ["swaps", "price"] }),
    )
    .await;
    let ack = next_json(&mut ws).await;
    assert_eq!(ack["type"], "response");
    assert_eq!(ack["id"], "sub-1");
    assert_eq!(ack["payload"]["wildcard"], false);

    api.fund_and_deposit("0xdeployer", 100_000, 100_000).await;
    api.credit("0xtrader", "A", 1_000).await;
    let (status, _) = api
        .post(
            "/api/v1/pool/swap",
            json!({ "holder": "0xtrader", "asset_in": "A", "amount_in": "1000" }),
        )
        .await;
    assert_eq!(status, 200);

    // The deposit's price event arrives before the swap.
    let price = next_event(&mut ws, "price_updated").await;
    assert_eq!(price["reason"], "liquidity_added");

    let swap = next_event(&mut ws, "swap_executed").await;
    assert_eq!(swap["holder"], "0xtrader");
    assert_eq!(swap["amount_in"], "1000");
    assert_eq!(swap["sequence"], 1);
}

#[tokio::test]
async fn holder_filter_only_forwards_matching_holders() {
    let addr = spawn_app().await;
    let api = Api::new(addr);
    let mut ws = connect(addr).await;

    send_command(
        &mut ws,
        "sub-escrow",
        json!({ "command": "subscribe", "topics": ["escrow"], "holders": ["0xwatched"] }),
    )
    .await;
    let ack = next_json(&mut ws).await;
    assert_eq!(ack["payload"]["holders"], 1);

    api.credit("0xother", "A", 5).await;
    api.credit("0xwatched", "B", 7).await;

    let event = next_event(&mut ws, "escrow_updated").await;
    assert_eq!(event["holder"], "0xwatched");
    assert_eq!(event["asset_b"], "7");
}

#[tokio::test]
async fn get_state_returns_pool_snapshot() {
    let addr = spawn_app().await;
    let api = Api::new(addr);
    api.fund_and_deposit("0xdeployer", 10, 20).await;

    let mut ws = connect(addr).await;
    send_command(&mut ws, "state-1", json!({ "command": "get_state" })).await;
    let reply = next_json(&mut ws).await;
    assert_eq!(reply["type"], "response");
    assert_eq!(reply["payload"]["reserve_b"], "20");
    assert_eq!(reply["payload"]["state"], "funded");
}

#[tokio::test]
async fn malformed_and_unknown_commands_are_errors() {
    let addr = spawn_app().await;
    let mut ws = connect(addr).await;

    ws.send(Message::text("not json")).await.unwrap();
    let reply = next_json(&mut ws).await;
    assert_eq!(reply["type"], "error");
    assert_eq!(reply["payload"]["code"], 400);

    send_command(&mut ws, "bad-topic", json!({ "command": "subscribe", "topics": ["trades"] }))
        .await;
    let reply = next_json(&mut ws).await;
    assert_eq!(reply["type"], "error");
    assert_eq!(reply["id"], "bad-topic");

    send_command(&mut ws, "nope", json!({ "command": "launch" })).await;
    let reply = next_json(&mut ws).await;
    assert_eq!(reply["payload"]["code"], 404);
}
