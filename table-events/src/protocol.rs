//! JSON messages exchanged with the event server.
//!
//! The server may pack several messages into one text frame, one per line.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use snafu::ResultExt;

use crate::error::*;

/// A message sent by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    /// Start receiving events for a table.
    Subscribe {
        /// Table identifier.
        game_id: String,
    },
    /// Stop receiving events for a table.
    Unsubscribe {
        /// Table identifier.
        game_id: String,
    },
    /// Liveness check, answered with a pong.
    Ping,
}

impl ClientMessage {
    /// JSON text of the message.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context(EncodeSnafu)
    }
}

/// What happened at the table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    /// Full table state, sent right after subscribing.
    State,
    /// An action entered the mempool.
    Pending,
    /// An action was included in a block.
    Confirmed,
    /// Acknowledgement to the acting player.
    ActionAccepted,
    /// The server reports a problem.
    Error,
    /// A player acted.
    ActionPerformed,
    /// A player took a seat.
    PlayerJoinedGame,
    /// The table was created.
    GameCreated,
    /// A kind this client does not know yet.
    Other(String),
}

impl EventKind {
    /// Wire name.
    pub fn as_str(&self) -> &str {
        match self {
            EventKind::State => "state",
            EventKind::Pending => "pending",
            EventKind::Confirmed => "confirmed",
            EventKind::ActionAccepted => "action_accepted",
            EventKind::Error => "error",
            EventKind::ActionPerformed => "action_performed",
            EventKind::PlayerJoinedGame => "player_joined_game",
            EventKind::GameCreated => "game_created",
            EventKind::Other(name) => name,
        }
    }
}

impl From<String> for EventKind {
    fn from(name: String) -> Self {
        match name.as_str() {
            "state" => EventKind::State,
            "pending" => EventKind::Pending,
            "confirmed" => EventKind::Confirmed,
            "action_accepted" => EventKind::ActionAccepted,
            "error" => EventKind::Error,
            "action_performed" => EventKind::ActionPerformed,
            "player_joined_game" => EventKind::PlayerJoinedGame,
            "game_created" => EventKind::GameCreated,
            _ => EventKind::Other(name),
        }
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One pushed table event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableEvent {
    /// Table the event belongs to.
    pub game_id: String,
    /// RFC 3339 server timestamp.
    #[serde(default)]
    pub timestamp: String,
    /// What happened.
    pub event: EventKind,
    /// Event payload, passed through untouched.
    #[serde(default)]
    pub data: Value,
}

/// A message received from the server.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    /// A table event.
    Event(TableEvent),
    /// Answer to a ping.
    Pong,
}

impl ServerMessage {
    /// Parses one line of a server frame.
    pub fn parse(line: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(line).context(DecodeSnafu { line })?;
        if value.get("type").and_then(Value::as_str) == Some("pong") {
            return Ok(ServerMessage::Pong);
        }
        let event = serde_json::from_value(value).context(DecodeSnafu { line })?;
        Ok(ServerMessage::Event(event))
    }
}

/// Parses every non-empty line of a text frame.
pub fn parse_frame(frame: &str) -> Vec<Result<ServerMessage>> {
    frame
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ServerMessage::parse)
        .collect()
}
