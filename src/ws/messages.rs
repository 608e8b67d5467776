//! WebSocket message types: envelope and commands.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Top-level WebSocket message envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsMessage {
    /// Client-provided ID for requests; server-generated for events.
    pub id: String,
    /// Message type discriminator.
    #[serde(rename = "type")]
    pub msg_type: WsMessageType,
    /// ISO-8601 timestamp.
    pub timestamp: DateTime<Utc>,
    /// Variant-specific payload.
    pub payload: serde_json::Value,
}

impl WsMessage {
    /// Builds a server message stamped with the current time.
    #[must_use]
    pub fn new(id: impl Into<String>, msg_type: WsMessageType, payload: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            msg_type,
            timestamp: Utc::now(),
            payload,
        }
    }

    /// Builds an error message answering request `id`.
    #[must_use]
    pub fn error(id: impl Into<String>, code: u16, message: &str) -> Self {
        Self::new(
            id,
            WsMessageType::Error,
            serde_json::json!({ "code": code, "message": message }),
        )
    }
}

/// Discriminator for WebSocket message types.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WsMessageType {
    /// Client → Server command.
    Command,
    /// Server → Client response to a command.
    Response,
    /// Server → Client broadcast event.
    Event,
    /// Server → Client error.
    Error,
}

/// Commands that a client can send in the payload of a `command` message.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum WsCommand {
    /// Subscribe to topics. Use `["*"]` for every topic.
    Subscribe {
        /// Topic names: `swaps`, `liquidity`, `price`, `escrow`, or `*`.
        topics: Vec<String>,
        /// Restrict holder-specific events to these holders.
        #[serde(default)]
        holders: Vec<String>,
    },
    /// Unsubscribe from topics and holders.
    Unsubscribe {
        /// Topic names to drop.
        #[serde(default)]
        topics: Vec<String>,
        /// Holders to drop from the filter.
        #[serde(default)]
        holders: Vec<String>,
    },
    /// Get the current pool state.
    GetState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribe_command_parses_without_holders() {
        let payload = serde_json::json!({ "command": "subscribe", "topics": ["swaps"] });
        let command = serde_json::from_value::<WsCommand>(payload);
        assert!(matches!(
            command,
            Ok(WsCommand::Subscribe { ref topics, ref holders }) if topics.len() == 1 && holders.is_empty()
        ));
    }

    #[test]
    fn envelope_uses_type_key() {
        let msg = WsMessage::error("req-1", 400, "bad");
        let json = serde_json::to_value(&msg).unwrap_or_default();
        assert_eq!(json["type"], "error");
        assert_eq!(json["payload"]["code"], 400);
    }
}
