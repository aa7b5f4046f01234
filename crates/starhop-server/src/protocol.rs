//! Wire messages.
//!
//! Every message is one JSON object tagged by its `type` field.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use starhop_core::{Cell, Color};

/// Status text sent after an action is handled.
pub const STATUS_SUCCESS: &str = "Success";

/// Status text sent to a link that has been replaced by a reconnect.
pub const STATUS_REPLACED: &str = "Another connection has been established with the same user_id!";

/// Client-to-server messages
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Open a new room and join it
    Create { name: String },
    /// Join an existing room
    Join { game_id: String, name: String },
    /// Take back a seat after losing the link
    Reconnect { game_id: String, user_id: String },
    /// Pick a color, or 0 to clear it
    SelectColor { color: u8 },
    AddBot { color: u8 },
    RemoveBot { color: u8 },
    Start,
    /// Play a move; an empty list passes
    Move { moves: Vec<Cell> },
    /// Keep the link alive; answered with a pong and nothing else
    Ping { timestamp: u64 },
}

/// Server-to-client messages
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    GameState(GameStateView),
    Status { status: String },
    /// Pong response
    Pong {
        client_timestamp: u64,
        server_timestamp: u64,
    },
}

impl ServerMessage {
    pub fn status(text: impl Into<String>) -> Self {
        ServerMessage::Status {
            status: text.into(),
        }
    }
}

/// Room lifecycle, sent as 0, 1 or 2
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum RoomStatus {
    Forming,
    InProgress,
    Finished,
}

impl From<RoomStatus> for u8 {
    fn from(status: RoomStatus) -> Self {
        match status {
            RoomStatus::Forming => 0,
            RoomStatus::InProgress => 1,
            RoomStatus::Finished => 2,
        }
    }
}

impl TryFrom<u8> for RoomStatus {
    type Error = String;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(RoomStatus::Forming),
            1 => Ok(RoomStatus::InProgress),
            2 => Ok(RoomStatus::Finished),
            other => Err(format!("unknown room status {other}")),
        }
    }
}

/// Snapshot of a room, personalised with the recipient's user id and color
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameStateView {
    pub id: String,
    pub status: RoomStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board: Option<Vec<Vec<u8>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub players: Option<Vec<Color>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turn: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_moves: Option<Vec<Cell>>,
    pub connections: Vec<ConnectionView>,
    pub user_id: Option<String>,
    /// 0 when the recipient has no color
    pub color: u8,
}

/// One seat in a room as other players see it
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConnectionView {
    pub name: String,
    pub color: u8,
    pub is_bot: bool,
    pub connected: bool,
    pub last_state_change: DateTime<Utc>,
}

/// Serialize a server message as a single JSON line (without the newline)
pub fn serialize_server_message(msg: &ServerMessage) -> Result<String, serde_json::Error> {
    serde_json::to_string(msg)
}

/// Deserialize a server message from one JSON line
pub fn deserialize_server_message(line: &str) -> Result<ServerMessage, serde_json::Error> {
    serde_json::from_str(line)
}

/// Serialize a client message as a single JSON line (without the newline)
pub fn serialize_client_message(msg: &ClientMessage) -> Result<String, serde_json::Error> {
    serde_json::to_string(msg)
}

/// Deserialize a client message from one JSON line
pub fn deserialize_client_message(line: &str) -> Result<ClientMessage, serde_json::Error> {
    serde_json::from_str(line)
}
