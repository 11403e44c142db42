use serde::{Deserialize, Serialize};

use crate::board::{GameResult, GameState, Mark};

/// A connection's membership in a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub connection_id: String,
    pub username: String,
    pub room: String,
}

/// What the rest of a room sees of a member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub username: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
        }
    }
}

/// Messages sent from server to clients via WebSocket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerMsg {
    // Joining
    RoomJoined {
        room: String,
    },
    RoomFull {
        message: String,
    },
    RoomUsers {
        room: String,
        users: Vec<UserSummary>,
    },
    MarkAssigned {
        mark: Mark,
    },
    Message {
        username: String,
        text: String,
    },

    // Game
    GameStateUpdate(GameState),
    GameEnd(GameResult),
    GameRestarted(GameState),
    MoveRejected {
        reason: String,
    },

    ErrorMessage {
        message: String,
    },
}

/// Messages sent from clients to server via WebSocket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientMsg {
    JoinRoom { username: String, room: String },
    // Signed so a negative index is refused as a move rather than as bad JSON.
    MakeMove { room_id: String, cell_index: i64 },
    RestartGame { room_id: String },
}
