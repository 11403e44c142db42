use tokio::sync::{broadcast, mpsc};

use crate::engine::{GameStore, MoveOutcome};
use crate::error::MoveError;
use crate::rooms::{RoomRegistry, SymbolTable};
use crate::types::*;

/// Commands the WebSocket handler sends to the lobby task.
#[derive(Debug, Clone)]
pub enum LobbyCommand {
    Join {
        connection_id: String,
        username: String,
        room: String,
    },
    MakeMove {
        connection_id: String,
        room: String,
        cell_index: i64,
    },
    Restart {
        connection_id: String,
        room: String,
    },
    Disconnect {
        connection_id: String,
    },
}

/// Events broadcast from the lobby to WebSocket connections.
#[derive(Debug, Clone)]
pub enum LobbyEvent {
    /// Send a message to a specific connection.
    SendTo { connection_id: String, msg: ServerMsg },
    /// Send a message to each listed connection.
    Broadcast {
        recipients: Vec<String>,
        msg: ServerMsg,
    },
}

impl LobbyEvent {
    pub fn is_for(&self, connection_id: &str) -> bool {
        match self {
            Self::SendTo {
                connection_id: target,
                ..
            } => target == connection_id,
            Self::Broadcast { recipients, .. } => recipients.iter().any(|r| r == connection_id),
        }
    }

    pub fn msg(&self) -> &ServerMsg {
        match self {
            Self::SendTo { msg, .. } | Self::Broadcast { msg, .. } => msg,
        }
    }
}

#[derive(Clone)]
pub struct LobbyHandle {
    pub cmd_tx: mpsc::Sender<LobbyCommand>,
    pub event_tx: broadcast::Sender<LobbyEvent>,
}

impl LobbyHandle {
    /// Subscribe before sending any command whose replies you need.
    pub fn subscribe(&self) -> broadcast::Receiver<LobbyEvent> {
        self.event_tx.subscribe()
    }

    pub async fn send(&self, cmd: LobbyCommand) {
        if self.cmd_tx.send(cmd).await.is_err() {
            tracing::error!("Lobby task is gone, command dropped");
        }
    }
}

/// Owns every room, game and mark. Commands are handled one at a time.
pub struct Lobby {
    bot_name: String,
    rooms: RoomRegistry,
    games: GameStore,
    marks: SymbolTable,
}

impl Lobby {
    pub fn new(bot_name: impl Into<String>) -> Self {
        Self {
            bot_name: bot_name.into(),
            rooms: RoomRegistry::new(),
            games: GameStore::new(),
            marks: SymbolTable::new(),
        }
    }

    pub fn handle(&mut self, tx: &broadcast::Sender<LobbyEvent>, cmd: LobbyCommand) {
        match cmd {
            LobbyCommand::Join {
                connection_id,
                username,
                room,
            } => self.handle_join(tx, connection_id, username, room),
            LobbyCommand::MakeMove {
                connection_id,
                room,
                cell_index,
            } => self.handle_move(tx, connection_id, room, cell_index),
            LobbyCommand::Restart {
                connection_id,
                room,
            } => self.handle_restart(tx, connection_id, room),
            LobbyCommand::Disconnect { connection_id } => {
                self.handle_disconnect(tx, connection_id)
            }
        }
    }

    fn send_to(&self, tx: &broadcast::Sender<LobbyEvent>, connection_id: &str, msg: ServerMsg) {
        let _ = tx.send(LobbyEvent::SendTo {
            connection_id: connection_id.to_string(),
            msg,
        });
    }

    fn broadcast(&self, tx: &broadcast::Sender<LobbyEvent>, room: &str, msg: ServerMsg) {
        let recipients = self.rooms.connection_ids(room);
        if recipients.is_empty() {
            return;
        }
        let _ = tx.send(LobbyEvent::Broadcast { recipients, msg });
    }

    fn broadcast_except(
        &self,
        tx: &broadcast::Sender<LobbyEvent>,
        room: &str,
        exclude: &str,
        msg: ServerMsg,
    ) {
        let recipients: Vec<String> = self
            .rooms
            .connection_ids(room)
            .into_iter()
            .filter(|id| id != exclude)
            .collect();
        if recipients.is_empty() {
            return;
        }
        let _ = tx.send(LobbyEvent::Broadcast { recipients, msg });
    }

    fn broadcast_users(&self, tx: &broadcast::Sender<LobbyEvent>, room: &str) {
        let users = self.rooms.list_users(room).map(UserSummary::from).collect();
        self.broadcast(
            tx,
            room,
            ServerMsg::RoomUsers {
                room: room.to_string(),
                users,
            },
        );
    }

    fn bot_message(&self, text: String) -> ServerMsg {
        ServerMsg::Message {
            username: self.bot_name.clone(),
            text,
        }
    }

    fn handle_join(
        &mut self,
        tx: &broadcast::Sender<LobbyEvent>,
        connection_id: String,
        username: String,
        room: String,
    ) {
        let user = match self.rooms.join_room(&connection_id, &username, &room) {
            Ok(user) => user,
            Err(e) => {
                tracing::info!("{} turned away from {}: {}", connection_id, room, e);
                self.send_to(tx, &connection_id, ServerMsg::RoomFull {
                    message: e.to_string(),
                });
                return;
            }
        };

        self.send_to(tx, &connection_id, self.bot_message("Welcome to the game".to_string()));
        self.broadcast_except(
            tx,
            &room,
            &connection_id,
            self.bot_message(format!("{} has joined the game", user.username)),
        );
        self.broadcast_users(tx, &room);
        self.send_to(tx, &connection_id, ServerMsg::RoomJoined { room: room.clone() });

        self.games.ensure_game(&room);
        let mark = self.marks.assign_if_absent(&connection_id, &room, &self.rooms);

        self.send_to(tx, &connection_id, ServerMsg::MarkAssigned { mark });
        if let Some(state) = self.games.get_game(&room) {
            self.send_to(tx, &connection_id, ServerMsg::GameStateUpdate(state.clone()));
        }

        tracing::info!("{} joined {} as {} playing {}", connection_id, room, user.username, mark);
    }

    fn handle_move(
        &mut self,
        tx: &broadcast::Sender<LobbyEvent>,
        connection_id: String,
        room: String,
        cell_index: i64,
    ) {
        // A mark only counts in a room the connection is actually in.
        let mark = self
            .marks
            .mark_of(&connection_id)
            .filter(|_| self.rooms.is_member(&connection_id, &room));

        match self.games.make_move(&room, cell_index, mark) {
            Ok(MoveOutcome::Applied(state)) => {
                self.broadcast(tx, &room, ServerMsg::GameStateUpdate(state));
            }
            Ok(MoveOutcome::Ended(result)) => {
                tracing::info!("Game in {} ended: {}", room, result.message);
                self.broadcast(tx, &room, ServerMsg::GameEnd(result));
            }
            Err(e) => {
                if let MoveError::UnknownRoom(_) = e {
                    tracing::warn!("Move from {}: {}", connection_id, e);
                } else {
                    tracing::debug!("Move from {} in {} refused: {}", connection_id, room, e);
                }
                self.send_to(tx, &connection_id, ServerMsg::MoveRejected {
                    reason: e.to_string(),
                });
            }
        }
    }

    fn handle_restart(
        &mut self,
        tx: &broadcast::Sender<LobbyEvent>,
        connection_id: String,
        room: String,
    ) {
        if !self.rooms.is_member(&connection_id, &room) {
            tracing::debug!("Ignoring restart of {} from non-member {}", room, connection_id);
            return;
        }

        match self.games.reset_game(&room).cloned() {
            Some(state) => {
                tracing::info!("Game in {} restarted by {}", room, connection_id);
                self.broadcast(tx, &room, ServerMsg::GameRestarted(state));
            }
            None => tracing::debug!("Ignoring restart of {}: no game", room),
        }
    }

    fn handle_disconnect(&mut self, tx: &broadcast::Sender<LobbyEvent>, connection_id: String) {
        while let Some(user) = self.rooms.leave(&connection_id) {
            self.broadcast(
                tx,
                &user.room,
                self.bot_message(format!("{} has left the game", user.username)),
            );
            self.broadcast_users(tx, &user.room);

            if self.rooms.is_empty(&user.room) {
                self.games.remove_game(&user.room);
                self.marks.release_room(&user.room);
                tracing::info!(
                    "Room {} is empty, game discarded ({} games, {} marks live)",
                    user.room,
                    self.games.len(),
                    self.marks.len()
                );
            }
        }

        self.marks.release(&connection_id);
    }
}

/// Spawn the lobby task. Returns the handle sockets use to reach it.
pub fn spawn_lobby(lobby: Lobby, buffer: usize) -> LobbyHandle {
    let buffer = buffer.max(1);
    let (cmd_tx, cmd_rx) = mpsc::channel(buffer);
    let (event_tx, _) = broadcast::channel(buffer);

    tokio::spawn(lobby_task(lobby, cmd_rx, event_tx.clone()));

    LobbyHandle { cmd_tx, event_tx }
}

async fn lobby_task(
    mut lobby: Lobby,
    mut cmd_rx: mpsc::Receiver<LobbyCommand>,
    event_tx: broadcast::Sender<LobbyEvent>,
) {
    while let Some(cmd) = cmd_rx.recv().await {
        lobby.handle(&event_tx, cmd);
    }

    tracing::info!("Lobby task ended");
}
