//! Drives one upgraded socket: inbound frames, room fan-out, teardown.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use chrono::Utc;
use tokio::sync::mpsc;

use super::protocol::{ClientMessage, CommentEvent, ServerMessage};
use super::rooms::RoomRegistry;
use super::session::Connection;

pub async fn serve(
    mut socket: WebSocket,
    connection: Connection,
    rooms: Arc<RoomRegistry>,
    max_send_queue: usize,
) {
    let connection_id = connection.id();
    tracing::info!(connection_id = %connection_id, author = %connection.author(), "websocket connected");

    let (outbound_tx, mut outbound_rx) = mpsc::channel::<ServerMessage>(max_send_queue);

    let ready = ServerMessage::Ready {
        connection_id: connection_id.to_string(),
        user: connection.user_value(),
    };

    if send(&mut socket, &ready).await {
        loop {
            tokio::select! {
                incoming = socket.recv() => match incoming {
                    Some(Ok(Message::Text(text))) => {
                        let reply = handle_frame(&connection, &rooms, &outbound_tx, text.as_str()).await;
                        if let Some(reply) = reply {
                            if !send(&mut socket, &reply).await {
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    // ping/pong are answered by axum; binary frames are not part of the protocol
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        tracing::debug!(connection_id = %connection_id, error = %err, "websocket read failed");
                        break;
                    }
                },
                Some(outgoing) = outbound_rx.recv() => {
                    if !send(&mut socket, &outgoing).await {
                        break;
                    }
                }
            }
        }
    }

    rooms.leave_all(connection_id).await;
    tracing::info!(connection_id = %connection_id, "websocket disconnected");
}

async fn send(socket: &mut WebSocket, message: &ServerMessage) -> bool {
    let json = match serde_json::to_string(message) {
        Ok(json) => json,
        Err(err) => {
            tracing::error!(error = %err, "failed to encode server message");
            return false;
        }
    };
    socket.send(Message::Text(json.into())).await.is_ok()
}

/// Apply one inbound text frame. Returns the direct reply, if any.
///
/// Comments get no direct reply: the sender is a room member and receives the
/// broadcast through `outbound` like everyone else.
pub(crate) async fn handle_frame(
    connection: &Connection,
    rooms: &RoomRegistry,
    outbound: &mpsc::Sender<ServerMessage>,
    raw: &str,
) -> Option<ServerMessage> {
    let message = match serde_json::from_str::<ClientMessage>(raw) {
        Ok(message) => message,
        Err(err) => {
            tracing::debug!(connection_id = %connection.id(), error = %err, "unrecognized frame");
            return Some(ServerMessage::error("unrecognized message"));
        }
    };

    match message {
        ClientMessage::Join { track_id } => {
            rooms
                .join(&track_id, connection.id(), outbound.clone())
                .await;
            Some(ServerMessage::Joined { track_id })
        }
        ClientMessage::Leave { track_id } => {
            rooms.leave(&track_id, connection.id()).await;
            Some(ServerMessage::Left { track_id })
        }
        ClientMessage::Comment {
            track_id,
            body,
            at_seconds,
        } => {
            if body.trim().is_empty() {
                return Some(ServerMessage::error("comment body is empty"));
            }
            if !rooms.is_member(&track_id, connection.id()).await {
                return Some(ServerMessage::error("join the track before commenting"));
            }
            rooms
                .publish(CommentEvent {
                    track_id,
                    author: connection.author(),
                    body,
                    at_seconds,
                    sent_at: Utc::now(),
                })
                .await;
            None
        }
        ClientMessage::Whoami => Some(ServerMessage::Identity {
            user: connection.user_value(),
        }),
    }
}
