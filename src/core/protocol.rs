/// Named events exchanged over the socket, JSON-encoded as `{"event": .., "data": ..}`
use serde::{Deserialize, Serialize};

use crate::core::game::Score;
use crate::core::registry::ConnectionId;

pub const GAME_START_MESSAGE: &str = "game started!";
pub const PLAYER_LEFT_MESSAGE: &str = "opponent left the game";

/// Commands a client may send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientCommand {
    CreateRoom(String),
    JoinRoom(String),
    Guess(GuessPayload),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuessPayload {
    pub room_id: String,
    pub number: String,
}

/// Notifications the server pushes to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    /// First frame on every connection: the id the server knows you by.
    Welcome { id: ConnectionId },
    RoomCreated(String),
    GameStart(String),
    GuessResult {
        player: ConnectionId,
        guess: String,
        result: Score,
    },
    GameOver {
        winner: ConnectionId,
        number: String,
    },
    PlayerLeft(String),
    Error(String),
}

impl ClientCommand {
    pub fn decode(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl ServerEvent {
    pub fn decode(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
