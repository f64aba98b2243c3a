//! Wire messages exchanged with the game socket.
//!
//! Everything travels as JSON text tagged by a `type` field. The probe only
//! ever sends a `ping`, and reads whatever comes back on a best-effort basis.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProbeError;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Ping { data: String },
}

impl ClientMessage {
    pub fn ping(data: &str) -> Self {
        ClientMessage::Ping {
            data: data.to_string(),
        }
    }

    pub fn encode(&self) -> Result<String, ProbeError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Pong {
        timestamp: Option<i64>,
        message: Option<String>,
    },
    Error {
        message: Option<String>,
    },
    GameState {
        game: Option<Value>,
        #[serde(default)]
        players: Vec<Value>,
        current_round: Option<Value>,
    },
    PlayerList {
        #[serde(default)]
        players: Vec<Value>,
    },
    BuzzOrder {
        #[serde(default)]
        ordered_buzzes: Vec<Value>,
        round: Option<i64>,
    },
    RoundState {
        state: Option<String>,
        round: Option<i64>,
    },
    JoinConfirmed {},
    StartRoundConfirmed {},
    SyncTimeResponse {
        client_time: Option<Value>,
        server_time: Option<i64>,
    },
}

impl ServerMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::Pong { .. } => "pong",
            ServerMessage::Error { .. } => "error",
            ServerMessage::GameState { .. } => "game_state",
            ServerMessage::PlayerList { .. } => "player_list",
            ServerMessage::BuzzOrder { .. } => "buzz_order",
            ServerMessage::RoundState { .. } => "round_state",
            ServerMessage::JoinConfirmed {} => "join_confirmed",
            ServerMessage::StartRoundConfirmed {} => "start_round_confirmed",
            ServerMessage::SyncTimeResponse { .. } => "sync_time_response",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Known(ServerMessage),
    /// Valid JSON, but not a message we model. `kind` is its `type` field, if it has one.
    Unrecognized { kind: Option<String> },
    Unparseable { reason: String },
}

impl Inbound {
    pub fn parse(text: &str) -> Self {
        let value: Value = match serde_json::from_str(text) {
            Ok(value) => value,
            Err(err) => {
                return Inbound::Unparseable {
                    reason: err.to_string(),
                }
            }
        };
        if value.is_null() {
            return Inbound::Unparseable {
                reason: "cannot read type of null".to_string(),
            };
        }
        // Non-string types are shown as their JSON text
        let kind = value.get("type").map(|kind| match kind {
            Value::String(kind) => kind.clone(),
            other => other.to_string(),
        });
        match ServerMessage::deserialize(value) {
            Ok(message) => Inbound::Known(message),
            Err(_) => Inbound::Unrecognized { kind },
        }
    }

    pub fn kind(&self) -> Option<&str> {
        match self {
            Inbound::Known(message) => Some(message.kind()),
            Inbound::Unrecognized { kind } => kind.as_deref(),
            Inbound::Unparseable { .. } => None,
        }
    }
}
