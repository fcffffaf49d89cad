// SPDX-License-Identifier: MIT

//! Conversation, message history, and chat session routes.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::db::firestore::MessageQueryCursor;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{ChatMessage, ChatSession};
use crate::services::presence::ConnectedUser;
use crate::services::WsEvent;
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;

const DEFAULT_PAGE_SIZE: u32 = 50;
const MAX_PAGE_SIZE: u32 = 200;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/conversations", get(get_conversations))
        .route("/api/messages/{partner}", get(get_messages))
        .route("/api/chats", get(get_active_chats))
        .route("/api/chats/close", post(close_chat))
        .route("/api/chats/history", get(get_chat_history))
        .route("/api/active-users", get(get_active_users))
}

// ─── Cursor Encoding ─────────────────────────────────────────

/// Encode a pagination cursor as opaque base64.
///
/// The separator is '|' because the RFC 3339 timestamp itself contains
/// ':' characters.
fn encode_cursor(sent_at: &str, message_id: &str) -> String {
    URL_SAFE_NO_PAD.encode(format!("{}|{}", sent_at, message_id))
}

/// Decode a pagination cursor, rejecting anything malformed.
fn parse_cursor(cursor: &str) -> Result<(String, String)> {
    let decoded = URL_SAFE_NO_PAD
        .decode(cursor)
        .map_err(|_| AppError::BadRequest("Invalid pagination cursor.".to_string()))?;
    let decoded = String::from_utf8(decoded)
        .map_err(|_| AppError::BadRequest("Invalid pagination cursor.".to_string()))?;

    let mut parts = decoded.splitn(2, '|');
    match (parts.next(), parts.next()) {
        (Some(sent_at), Some(id)) if !sent_at.is_empty() && !id.is_empty() => {
            Ok((sent_at.to_string(), id.to_string()))
        }
        _ => Err(AppError::BadRequest(
            "Invalid pagination cursor.".to_string(),
        )),
    }
}

// ─── Conversations ───────────────────────────────────────────

#[derive(Serialize)]
pub struct ConversationSummary {
    pub partner: String,
    pub last_message: String,
    pub last_from: String,
    pub last_at: String,
}

#[derive(Serialize)]
pub struct ConversationsResponse {
    pub success: bool,
    pub conversations: Vec<ConversationSummary>,
}

/// Distinct chat partners with the most recent message per pair,
/// newest conversation first.
async fn get_conversations(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ConversationsResponse>> {
    let messages = state.db.messages_involving(&user.email).await?;

    // Keep only the newest message per partner
    let mut latest: HashMap<String, ChatMessage> = HashMap::new();
    for message in messages {
        let partner = if message.from == user.email {
            message.to.clone()
        } else {
            message.from.clone()
        };
        match latest.get(&partner) {
            Some(existing) if existing.sent_at >= message.sent_at => {}
            _ => {
                latest.insert(partner, message);
            }
        }
    }

    let mut conversations: Vec<ConversationSummary> = latest
        .into_iter()
        .map(|(partner, message)| ConversationSummary {
            partner,
            last_message: message.body,
            last_from: message.from,
            last_at: message.sent_at,
        })
        .collect();
    conversations.sort_by(|a, b| b.last_at.cmp(&a.last_at));

    Ok(Json(ConversationsResponse {
        success: true,
        conversations,
    }))
}

// ─── Message History ─────────────────────────────────────────

#[derive(Deserialize)]
pub struct MessagesQuery {
    pub cursor: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Serialize)]
pub struct MessagesResponse {
    pub success: bool,
    /// Newest first
    pub messages: Vec<ChatMessage>,
    /// Present when another page may exist
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// Page through the message history with one partner, newest first.
async fn get_messages(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(partner): Path<String>,
    Query(query): Query<MessagesQuery>,
) -> Result<Json<MessagesResponse>> {
    let partner = partner.to_lowercase();
    let conversation_id = ChatMessage::conversation_id(&user.email, &partner);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE);

    let parsed = match &query.cursor {
        Some(cursor) => Some(parse_cursor(cursor)?),
        None => None,
    };
    let cursor = parsed.as_ref().map(|(sent_at, id)| MessageQueryCursor {
        sent_at,
        message_id: id,
    });

    let messages = state
        .db
        .conversation_messages(&conversation_id, cursor, limit)
        .await?;

    let next_cursor = if messages.len() as u32 == limit {
        messages
            .last()
            .map(|m| encode_cursor(&m.sent_at, &m.id))
    } else {
        None
    };

    Ok(Json(MessagesResponse {
        success: true,
        messages,
        next_cursor,
    }))
}

// ─── Active Chats ────────────────────────────────────────────

#[derive(Serialize)]
pub struct ActiveChat {
    pub session_id: String,
    pub partner: String,
    pub partner_username: Option<String>,
    pub subject: String,
    pub created_at: String,
    /// Whether this user asked for the help
    pub i_am_requester: bool,
}

#[derive(Serialize)]
pub struct ActiveChatsResponse {
    pub success: bool,
    pub chats: Vec<ActiveChat>,
}

/// Active chat sessions with partner details.
async fn get_active_chats(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ActiveChatsResponse>> {
    let sessions = state.db.chat_sessions_for(&user.email, true).await?;

    let partner_emails: Vec<String> = sessions
        .iter()
        .map(|s| s.partner_of(&user.email).to_string())
        .collect();
    let partners = state.db.get_users_by_emails(&partner_emails).await?;
    let usernames: HashMap<&str, &Option<String>> = partners
        .iter()
        .map(|u| (u.email.as_str(), &u.username))
        .collect();

    let chats = sessions
        .iter()
        .map(|session| {
            let partner = session.partner_of(&user.email);
            ActiveChat {
                session_id: session.id.clone(),
                partner: partner.to_string(),
                partner_username: usernames.get(partner).cloned().cloned().flatten(),
                subject: session.subject.clone(),
                created_at: session.created_at.clone(),
                i_am_requester: session.requester == user.email,
            }
        })
        .collect();

    Ok(Json(ActiveChatsResponse {
        success: true,
        chats,
    }))
}

// ─── Close ───────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CloseChatPayload {
    pub partner: String,
}

#[derive(Serialize)]
pub struct CloseChatResponse {
    pub success: bool,
    pub message: String,
}

/// Close the active session with a partner and notify them.
async fn close_chat(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CloseChatPayload>,
) -> Result<Json<CloseChatResponse>> {
    let partner = payload.partner.to_lowercase();

    let mut session = state
        .db
        .find_active_chat_between(&user.email, &partner)
        .await?
        .ok_or_else(|| {
            AppError::NotFound("No active chat session with this partner.".to_string())
        })?;

    session.active = false;
    session.closed_at = Some(format_utc_rfc3339(chrono::Utc::now()));
    session.closed_by = Some(user.email.clone());
    state.db.upsert_chat_session(&session).await?;

    state.presence.send_to(
        &partner,
        WsEvent::ChatClosed {
            partner: user.email.clone(),
        },
    );

    tracing::info!(closed_by = %user.email, partner = %partner, "Chat session closed");
    Ok(Json(CloseChatResponse {
        success: true,
        message: "Chat session ended.".to_string(),
    }))
}

// ─── History ─────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ClosedChat {
    pub partner: String,
    pub subject: String,
    pub created_at: String,
    pub closed_at: Option<String>,
}

#[derive(Serialize)]
pub struct ChatHistoryResponse {
    pub success: bool,
    /// Sessions where this user was the helper
    pub helped_by_me: Vec<ClosedChat>,
    /// Sessions where this user was helped
    pub helped_me: Vec<ClosedChat>,
}

/// Closed sessions, split by which side of the help this user was on.
async fn get_chat_history(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ChatHistoryResponse>> {
    let sessions = state.db.chat_sessions_for(&user.email, false).await?;

    let mut helped_by_me = Vec::new();
    let mut helped_me = Vec::new();
    for session in sessions {
        let entry = closed_entry(&session, &user.email);
        if session.helper == user.email {
            helped_by_me.push(entry);
        } else {
            helped_me.push(entry);
        }
    }
    helped_by_me.sort_by(|a, b| b.closed_at.cmp(&a.closed_at));
    helped_me.sort_by(|a, b| b.closed_at.cmp(&a.closed_at));

    Ok(Json(ChatHistoryResponse {
        success: true,
        helped_by_me,
        helped_me,
    }))
}

fn closed_entry(session: &ChatSession, viewer: &str) -> ClosedChat {
    ClosedChat {
        partner: session.partner_of(viewer).to_string(),
        subject: session.subject.clone(),
        created_at: session.created_at.clone(),
        closed_at: session.closed_at.clone(),
    }
}

// ─── Active Users ────────────────────────────────────────────

#[derive(Serialize)]
pub struct ActiveUsersResponse {
    pub success: bool,
    pub users: Vec<ConnectedUser>,
}

/// Currently connected users, excluding the caller.
async fn get_active_users(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ActiveUsersResponse>> {
    let users = state
        .presence
        .snapshot()
        .into_iter()
        .filter(|u| u.email != user.email)
        .collect();

    Ok(Json(ActiveUsersResponse {
        success: true,
        users,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_round_trip() {
        let cursor = encode_cursor("2026-03-01T10:30:00Z", "a1b2c3");
        let (sent_at, id) = parse_cursor(&cursor).unwrap();
        assert_eq!(sent_at, "2026-03-01T10:30:00Z");
        assert_eq!(id, "a1b2c3");
    }

    #[test]
    fn test_cursor_rejects_garbage() {
        assert!(parse_cursor("not base64 !!!").is_err());

        // Valid base64 but no separator
        let no_separator = URL_SAFE_NO_PAD.encode("just-one-field");
        assert!(parse_cursor(&no_separator).is_err());

        // Empty id half
        let empty_half = URL_SAFE_NO_PAD.encode("2026-03-01T10:30:00Z|");
        assert!(parse_cursor(&empty_half).is_err());
    }

    #[test]
    fn test_cursor_timestamp_colons_survive() {
        // The timestamp contains ':' so the separator must not be ':'
        let cursor = encode_cursor("2026-03-01T10:30:00.123Z", "id");
        let (sent_at, _) = parse_cursor(&cursor).unwrap();
        assert_eq!(sent_at, "2026-03-01T10:30:00.123Z");
    }
}
