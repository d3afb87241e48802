use std::collections::HashSet;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, instrument, warn};

use super::hub::{can_join, should_deliver};
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::jwt;

/// Browsers cannot set headers on WebSocket handshakes, so the bearer token
/// travels as a query parameter.
#[derive(Deserialize)]
pub struct WsQuery {
    token: String,
}

/// Client -> server commands on the fan-out socket.
#[derive(Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
enum ClientCommand {
    Join { room: String },
    Leave { room: String },
}

#[instrument(skip(state, ws, query))]
pub async fn upgrade(
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Result<Response, AppError> {
    let claims = jwt::verify(&query.token, &state.config.auth.jwt_secret)
        .map_err(|_| AppError::TokenInvalid)?;

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, claims.uid, claims.role)))
}

async fn handle_socket(socket: WebSocket, state: AppState, user_id: i32, role: String) {
    debug!(user_id, %role, "realtime client connected");

    let (mut sink, mut stream) = socket.split();
    let mut rx = state.hub.subscribe();
    let mut joined: HashSet<String> = HashSet::new();

    loop {
        tokio::select! {
            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        handle_command(&text, &role, &mut joined, user_id);
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {} // Ping/pong/binary: nothing to do.
                    Some(Err(e)) => {
                        debug!(user_id, "realtime socket error: {e}");
                        break;
                    }
                }
            }
            outgoing = rx.recv() => {
                match outgoing {
                    Ok(envelope) => {
                        if !should_deliver(&joined, &envelope) {
                            continue;
                        }
                        let Ok(text) = serde_json::to_string(&envelope) else {
                            continue;
                        };
                        if sink.send(Message::Text(text.into())).await.is_err() {
                            break;
                        }
                    }
                    // Lagged receivers are disconnected; clients reconcile
                    // over REST on reconnect.
                    Err(RecvError::Lagged(missed)) => {
                        warn!(user_id, missed, "realtime client lagged, disconnecting");
                        break;
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }

    debug!(user_id, "realtime client disconnected");
}

fn handle_command(text: &str, role: &str, joined: &mut HashSet<String>, user_id: i32) {
    match serde_json::from_str::<ClientCommand>(text) {
        Ok(ClientCommand::Join { room }) => {
            if can_join(role, &room) {
                debug!(user_id, %room, "joined room");
                joined.insert(room);
            } else {
                debug!(user_id, %room, "join refused");
            }
        }
        Ok(ClientCommand::Leave { room }) => {
            joined.remove(&room);
        }
        Err(e) => {
            debug!(user_id, "ignoring malformed realtime command: {e}");
        }
    }
}
