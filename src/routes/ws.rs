// SPDX-License-Identifier: MIT

//! WebSocket endpoint for chat and presence.
//!
//! Authenticated by the same session cookie as the HTTP routes (the
//! upgrade request passes through `require_auth`). Each connection gets
//! an unbounded channel; HTTP handlers push events through the presence
//! registry and a writer task forwards them onto the socket.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
    routing::get,
    Extension, Router,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::db::random_hex_id;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{ChatMessage, User};
use crate::services::presence::ConnectedUser;
use crate::services::WsEvent;
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/ws", get(ws_upgrade))
}

/// Frames accepted from the client.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientFrame {
    Message { to: String, body: String },
}

async fn ws_upgrade(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ws: WebSocketUpgrade,
) -> Result<Response> {
    let profile = state
        .db
        .get_user(&user.email)
        .await?
        .ok_or(AppError::Unauthorized)?;

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, profile)))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, profile: User) {
    let email = profile.email.clone();
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<WsEvent>();

    state.presence.register(
        ConnectedUser {
            email: email.clone(),
            username: profile.username.clone(),
            grade: profile.grade.clone(),
            section: profile.section.clone(),
            connected_at: format_utc_rfc3339(chrono::Utc::now()),
        },
        tx.clone(),
    );
    state.presence.broadcast(WsEvent::Presence {
        email: email.clone(),
        online: true,
    });
    tracing::info!(email = %email, "WebSocket connected");

    loop {
        tokio::select! {
            // Events queued by HTTP handlers or other connections
            event = rx.recv() => {
                let Some(event) = event else { break };
                let json = match serde_json::to_string(&event) {
                    Ok(json) => json,
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to serialize WebSocket event");
                        continue;
                    }
                };
                if sink.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
            // Frames from the client
            frame = stream.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        handle_client_frame(&state, &profile, &tx, text.as_str()).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {} // pings are answered by the protocol layer
                    Some(Err(e)) => {
                        tracing::debug!(email = %email, error = %e, "WebSocket read error");
                        break;
                    }
                }
            }
        }
    }

    // A reconnect may have replaced this entry; only the connection that
    // still owns it announces the user as offline.
    if state.presence.unregister(&email, &tx) {
        state.presence.broadcast(WsEvent::Presence {
            email: email.clone(),
            online: false,
        });
        tracing::info!(email = %email, "WebSocket disconnected");
    } else {
        tracing::debug!(email = %email, "Stale WebSocket connection closed");
    }
}

/// Handle one inbound frame: persist the message, deliver to the
/// recipient if connected, and echo back to the sender.
async fn handle_client_frame(
    state: &AppState,
    sender: &User,
    echo: &mpsc::UnboundedSender<WsEvent>,
    text: &str,
) {
    let frame: ClientFrame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::debug!(email = %sender.email, error = %e, "Ignoring malformed client frame");
            return;
        }
    };

    match frame {
        ClientFrame::Message { to, body } => {
            let body = body.trim().to_string();
            if body.is_empty() {
                return;
            }
            let to = to.to_lowercase();

            let id = match random_hex_id(16) {
                Ok(id) => id,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to generate message ID");
                    return;
                }
            };
            let message = ChatMessage {
                id,
                conversation_id: ChatMessage::conversation_id(&sender.email, &to),
                from: sender.email.clone(),
                to: to.clone(),
                body: body.clone(),
                sent_at: format_utc_rfc3339(chrono::Utc::now()),
            };

            if let Err(e) = state.db.insert_message(&message).await {
                tracing::error!(error = %e, from = %sender.email, "Failed to persist message");
                return;
            }

            let event = WsEvent::Message {
                from: sender
                    .username
                    .clone()
                    .unwrap_or_else(|| sender.name.clone()),
                from_email: sender.email.clone(),
                body,
                sent_at: message.sent_at.clone(),
            };
            state.presence.send_to(&to, event.clone());
            // Echo so the sender's other tabs render it too
            let _ = echo.send(event);
        }
    }
}
