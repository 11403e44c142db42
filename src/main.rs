mod board;
mod config;
mod engine;
mod error;
mod lobby;
mod rooms;
mod types;

use std::collections::HashMap;
use std::sync::Arc;

use askama::Template;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::Router;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::Mutex;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::error::ServerError;
use crate::lobby::{Lobby, LobbyCommand, LobbyHandle};
use crate::types::*;

#[derive(Clone)]
struct AppState {
    lobby: LobbyHandle,
}

// ─── Templates ────────────────────────────────────────────────────

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate;

#[derive(Template)]
#[template(path = "game.html")]
struct GameTemplate {
    username: String,
    room: String,
}

// ─── Routes ───────────────────────────────────────────────────────

async fn index_page() -> impl IntoResponse {
    Html(IndexTemplate.to_string())
}

async fn game_page(Query(params): Query<HashMap<String, String>>) -> Response {
    let field = |key: &str| {
        params
            .get(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    match (field("username"), field("room")) {
        (Some(username), Some(room)) => Html(GameTemplate { username, room }.to_string()).into_response(),
        _ => Redirect::to("/").into_response(),
    }
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (sender, mut receiver) = socket.split();
    let sender = Arc::new(Mutex::new(sender));

    let connection_id = uuid::Uuid::new_v4().to_string();
    tracing::info!("WebSocket connected: {}", connection_id);

    // Subscribe before any command goes out so no reply is missed.
    let mut event_rx = state.lobby.subscribe();

    let sender_clone = sender.clone();
    let connection_id_clone = connection_id.clone();

    let event_task = tokio::spawn(async move {
        loop {
            match event_rx.recv().await {
                Ok(event) => {
                    if !event.is_for(&connection_id_clone) {
                        continue;
                    }
                    if !send_msg(&sender_clone, event.msg()).await {
                        return;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("{} lagged, skipped {} events", connection_id_clone, skipped);
                }
                Err(RecvError::Closed) => return,
            }
        }
    });

    // Process incoming messages
    while let Some(Ok(msg)) = receiver.next().await {
        let Message::Text(text) = msg else { continue };

        match to_command(&connection_id, &text) {
            Ok(cmd) => state.lobby.send(cmd).await,
            Err(reply) => {
                send_msg(&sender, &reply).await;
            }
        }
    }

    // Socket disconnected
    tracing::info!("WebSocket disconnected: {}", connection_id);
    event_task.abort();

    state
        .lobby
        .send(LobbyCommand::Disconnect { connection_id })
        .await;
}

/// Decodes a client frame into a lobby command. A frame that does not parse
/// gets an `ErrorMessage` back and the socket stays open.
fn to_command(connection_id: &str, text: &str) -> Result<LobbyCommand, ServerMsg> {
    let client_msg: ClientMsg = serde_json::from_str(text).map_err(|e| {
        tracing::warn!("Invalid message from {}: {}", connection_id, e);
        ServerMsg::ErrorMessage {
            message: format!("Invalid message: {}", e),
        }
    })?;

    let connection_id = connection_id.to_string();
    Ok(match client_msg {
        ClientMsg::JoinRoom { username, room } => LobbyCommand::Join {
            connection_id,
            username,
            room,
        },
        ClientMsg::MakeMove { room_id, cell_index } => LobbyCommand::MakeMove {
            connection_id,
            room: room_id,
            cell_index,
        },
        ClientMsg::RestartGame { room_id } => LobbyCommand::Restart {
            connection_id,
            room: room_id,
        },
    })
}

/// Returns false once the socket can no longer be written to.
async fn send_msg(sender: &Arc<Mutex<SplitSink<WebSocket, Message>>>, msg: &ServerMsg) -> bool {
    let json = match serde_json::to_string(msg) {
        Ok(json) => json,
        Err(e) => {
            tracing::error!("Failed to encode message: {}", e);
            return true;
        }
    };
    let mut s = sender.lock().await;
    s.send(Message::Text(json.into())).await.is_ok()
}

// ─── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    tracing_subscriber::fmt::init();

    config::init()?;
    let port = config::listen_port()?;
    let server_config = config::load_server_config()?;

    let lobby = lobby::spawn_lobby(
        Lobby::new(server_config.bot_name.clone()),
        server_config.event_buffer,
    );

    let state = AppState { lobby };

    let app = Router::new()
        .route("/", get(index_page))
        .route("/game", get(game_page))
        .route("/ws", get(ws_handler))
        .nest_service("/static", ServeDir::new(&server_config.static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    tracing::info!("Tic-tac-toe server running on port {}", port);

    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_error_reply(result: Result<LobbyCommand, ServerMsg>) -> bool {
        matches!(result, Err(ServerMsg::ErrorMessage { .. }))
    }

    #[test]
    fn frames_map_to_lobby_commands() {
        let cmd = to_command("c1", r#"{"type":"makeMove","roomId":"lobby","cellIndex":-2}"#).unwrap();
        assert!(matches!(
            cmd,
            LobbyCommand::MakeMove { ref connection_id, ref room, cell_index: -2 }
                if connection_id == "c1" && room == "lobby"
        ));

        let cmd = to_command("c1", r#"{"type":"joinRoom","username":"ann","room":"lobby"}"#).unwrap();
        assert!(matches!(cmd, LobbyCommand::Join { ref username, .. } if username == "ann"));

        let cmd = to_command("c1", r#"{"type":"restartGame","roomId":"lobby"}"#).unwrap();
        assert!(matches!(cmd, LobbyCommand::Restart { ref room, .. } if room == "lobby"));
    }

    #[test]
    fn malformed_json_gets_error_message() {
        assert!(is_error_reply(to_command("c1", "{ not json")));
        assert!(is_error_reply(to_command("c1", "")));
    }

    #[test]
    fn unknown_type_gets_error_message() {
        assert!(is_error_reply(to_command("c1", r#"{"type":"castSpell","roomId":"lobby"}"#)));
    }

    #[test]
    fn missing_fields_get_error_message() {
        assert!(is_error_reply(to_command("c1", r#"{"type":"makeMove","roomId":"lobby"}"#)));
        assert!(is_error_reply(to_command("c1", r#"{"type":"makeMove","roomId":"lobby","cellIndex":"four"}"#)));
    }
}
