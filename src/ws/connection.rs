//! WebSocket connection state machine.
//!
//! Handles the read/write loop for a single WebSocket connection,
//! dispatching incoming commands and forwarding filtered events.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use super::messages::{WsCommand, WsMessage, WsMessageType};
use super::subscription::SubscriptionManager;
use crate::api::dto::PoolResponse;
use crate::domain::{EventTopic, HolderId, PoolEvent};
use crate::service::PoolService;

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Reads commands from the client and dispatches them.
/// - Forwards matching events from the [`broadcast::Receiver`] to the client.
pub async fn run_connection(
    socket: WebSocket,
    mut event_rx: broadcast::Receiver<PoolEvent>,
    pool_service: Arc<PoolService>,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut subs = SubscriptionManager::new();

    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let response = handle_text_message(&text, &mut subs, &pool_service).await;
                        let json = serde_json::to_string(&response).unwrap_or_default();
                        if ws_tx.send(Message::text(json)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
            event = event_rx.recv() => {
                match event {
                    Ok(pool_event) => {
                        if subs.matches(&pool_event) {
                            let msg = WsMessage::new(
                                uuid::Uuid::new_v4().to_string(),
                                WsMessageType::Event,
                                serde_json::to_value(&pool_event).unwrap_or_default(),
                            );
                            let json = serde_json::to_string(&msg).unwrap_or_default();
                            if ws_tx.send(Message::text(json)).await.is_err() {
                                break;
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(lagged = n, "ws client lagged behind event bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    tracing::debug!("ws connection closed");
}

/// Handles a text message from the client and returns the reply.
async fn handle_text_message(
    text: &str,
    subs: &mut SubscriptionManager,
    pool_service: &PoolService,
) -> WsMessage {
    let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
        return WsMessage::error("", 400, "malformed JSON");
    };
    let Ok(command) = serde_json::from_value::<WsCommand>(msg.payload) else {
        return WsMessage::error(msg.id, 404, "unknown command");
    };

    match command {
        WsCommand::Subscribe { topics, holders } => {
            let (topics, wildcard) = match parse_topics(&topics) {
                Ok(parsed) => parsed,
                Err(bad) => return WsMessage::error(msg.id, 400, &format!("unknown topic: {bad}")),
            };
            let Ok(holders) = parse_holders(&holders) else {
                return WsMessage::error(msg.id, 400, "holder must not be empty");
            };
            subs.subscribe(&topics, wildcard, &holders);
            WsMessage::new(
                msg.id,
                WsMessageType::Response,
                serde_json::json!({
                    "subscribed": subs.topics(),
                    "wildcard": subs.is_subscribed_all(),
                    "holders": subs.holder_count(),
                }),
            )
        }
        WsCommand::Unsubscribe { topics, holders } => {
            let (topics, wildcard) = match parse_topics(&topics) {
                Ok(parsed) => parsed,
                Err(bad) => return WsMessage::error(msg.id, 400, &format!("unknown topic: {bad}")),
            };
            let Ok(holders) = parse_holders(&holders) else {
                return WsMessage::error(msg.id, 400, "holder must not be empty");
            };
            subs.unsubscribe(&topics, wildcard, &holders);
            WsMessage::new(
                msg.id,
                WsMessageType::Response,
                serde_json::json!({
                    "subscribed": subs.topics(),
                    "wildcard": subs.is_subscribed_all(),
                    "holders": subs.holder_count(),
                }),
            )
        }
        WsCommand::GetState => {
            let state = PoolResponse::from(pool_service.summary().await);
            WsMessage::new(
                msg.id,
                WsMessageType::Response,
                serde_json::to_value(&state).unwrap_or_default(),
            )
        }
    }
}

/// Parses topic names. Returns the topics, whether `*` was present, or the
/// first unknown name.
fn parse_topics(raw: &[String]) -> Result<(Vec<EventTopic>, bool), String> {
    let mut topics = Vec::new();
    let mut wildcard = false;
    for name in raw {
        if name == "*" {
            wildcard = true;
        } else {
            topics.push(EventTopic::parse(name).ok_or_else(|| name.clone())?);
        }
    }
    Ok((topics, wildcard))
}

fn parse_holders(raw: &[String]) -> Result<Vec<HolderId>, String> {
    raw.iter().map(|h| HolderId::new(h.as_str())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topics_parse_with_wildcard() {
        let raw = vec!["swaps".to_string(), "*".to_string()];
        assert_eq!(parse_topics(&raw), Ok((vec![EventTopic::Swaps], true)));
        let raw = vec!["trades".to_string()];
        assert_eq!(parse_topics(&raw), Err("trades".to_string()));
    }

    #[test]
    fn blank_holder_is_rejected() {
        assert!(parse_holders(&[" ".to_string()]).is_err());
        assert_eq!(parse_holders(&["0xa".to_string()]).map(|h| h.len()), Ok(1));
    }
}
