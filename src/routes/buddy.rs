// SPDX-License-Identifier: MIT

//! Help-request broadcast and response routes.

use axum::{
    extract::State,
    routing::{get, post},
    Extension, Json, Router,
};
use futures_util::{stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::db::random_hex_id;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{ActivityLogEntry, ChatSession, Notification, NotificationSender, User};
use crate::services::WsEvent;
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;

const MAX_CONCURRENT_FANOUT: usize = 50;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/help-requests", post(broadcast_help_request))
        .route("/api/help-requests/respond", post(respond_to_request))
        .route("/api/notifications", get(get_notifications))
}

// ─── Broadcast ───────────────────────────────────────────────

#[derive(Deserialize)]
pub struct HelpRequestPayload {
    pub subject: String,
}

#[derive(Serialize)]
pub struct HelpRequestResponse {
    pub success: bool,
    pub notified: usize,
    pub message: String,
}

/// Broadcast a help request to every other user.
///
/// The notification is persisted on each recipient's document and pushed
/// over their WebSocket if they are connected. Fan-out is concurrent but
/// bounded; a single failed write fails the request so the caller can
/// retry.
async fn broadcast_help_request(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<HelpRequestPayload>,
) -> Result<Json<HelpRequestResponse>> {
    let subject = payload.subject.trim().to_string();
    if subject.is_empty() {
        return Err(AppError::BadRequest("Subject is required.".to_string()));
    }

    let me = require_named_user(&state, &user.email).await?;
    let username = display_name(&me);

    let now = format_utc_rfc3339(chrono::Utc::now());
    let notification = Notification {
        id: random_hex_id(16)?,
        kind: "help_request".to_string(),
        from: NotificationSender {
            username: username.clone(),
            email: me.email.clone(),
            grade: me.grade.clone(),
        },
        subject: subject.clone(),
        message: format!("{} needs help with {}!", username, subject),
        redirect: None,
        created_at: now.clone(),
    };

    let recipients = state.db.list_other_users(&me.email).await?;
    let notified = recipients.len();

    let results: Vec<Result<()>> = stream::iter(recipients)
        .map(|recipient| {
            let state = state.clone();
            let notification = notification.clone();
            async move {
                state
                    .db
                    .push_notification(&recipient.email, notification.clone())
                    .await?;
                state.presence.send_to(
                    &recipient.email,
                    WsEvent::Notification { notification },
                );
                Ok(())
            }
        })
        .buffer_unordered(MAX_CONCURRENT_FANOUT)
        .collect()
        .await;
    for result in results {
        result?;
    }

    state
        .db
        .insert_activity(&ActivityLogEntry {
            id: random_hex_id(16)?,
            kind: "help_request".to_string(),
            actor: me.email.clone(),
            actor_username: username.clone(),
            subject: subject.clone(),
            description: format!("{} requested help with {}", username, subject),
            logged_at: now,
        })
        .await?;

    tracing::info!(email = %me.email, subject = %subject, notified, "Help request broadcast");

    Ok(Json(HelpRequestResponse {
        success: true,
        notified,
        message: "Your help request has been sent to other students!".to_string(),
    }))
}

// ─── Notifications ───────────────────────────────────────────

#[derive(Serialize)]
pub struct NotificationsResponse {
    pub success: bool,
    pub notifications: Vec<Notification>,
}

/// The caller's pending notifications.
async fn get_notifications(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<NotificationsResponse>> {
    let me = state
        .db
        .get_user(&user.email)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.email)))?;

    Ok(Json(NotificationsResponse {
        success: true,
        notifications: me.notifications,
    }))
}

// ─── Respond ─────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RespondPayload {
    pub notification_id: String,
    /// Email of the user who asked for help
    pub requester: String,
    pub subject: String,
    pub accept: bool,
}

#[derive(Serialize)]
pub struct RespondResponse {
    pub success: bool,
    pub message: String,
    /// Set on accept so the frontend can open the chat view
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_partner: Option<String>,
}

/// Accept or decline a help request.
///
/// Either way the notification is consumed. Accepting opens an active
/// chat session (reusing an existing one if the pair already has one)
/// and notifies the requester.
async fn respond_to_request(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<RespondPayload>,
) -> Result<Json<RespondResponse>> {
    let requester_email = payload.requester.to_lowercase();

    state
        .db
        .remove_notification(&user.email, &payload.notification_id)
        .await?;

    if !payload.accept {
        return Ok(Json(RespondResponse {
            success: true,
            message: "Request declined.".to_string(),
            chat_partner: None,
        }));
    }

    let me = require_named_user(&state, &user.email).await?;
    let requester = state
        .db
        .get_user(&requester_email)
        .await?
        .ok_or_else(|| AppError::NotFound("Requester account no longer exists.".to_string()))?;
    let helper_name = display_name(&me);

    let now = format_utc_rfc3339(chrono::Utc::now());
    if state
        .db
        .find_active_chat_between(&me.email, &requester_email)
        .await?
        .is_none()
    {
        state
            .db
            .upsert_chat_session(&ChatSession {
                id: random_hex_id(16)?,
                requester: requester_email.clone(),
                helper: me.email.clone(),
                subject: payload.subject.clone(),
                active: true,
                created_at: now.clone(),
                closed_at: None,
                closed_by: None,
            })
            .await?;
    }

    state
        .db
        .insert_activity(&ActivityLogEntry {
            id: random_hex_id(16)?,
            kind: "helper_volunteered".to_string(),
            actor: me.email.clone(),
            actor_username: helper_name.clone(),
            subject: payload.subject.clone(),
            description: format!(
                "{} volunteered to help {} with {}",
                helper_name,
                display_name(&requester),
                payload.subject
            ),
            logged_at: now.clone(),
        })
        .await?;

    let accepted = Notification {
        id: random_hex_id(16)?,
        kind: "request_accepted".to_string(),
        from: NotificationSender {
            username: helper_name.clone(),
            email: me.email.clone(),
            grade: me.grade.clone(),
        },
        subject: payload.subject.clone(),
        message: format!(
            "{} accepted your help request for {}!",
            helper_name, payload.subject
        ),
        redirect: Some(format!("/chat?partner={}", urlencoding::encode(&me.email))),
        created_at: now,
    };
    state
        .db
        .push_notification(&requester_email, accepted.clone())
        .await?;
    state.presence.send_to(
        &requester_email,
        WsEvent::Notification {
            notification: accepted,
        },
    );

    tracing::info!(
        helper = %me.email,
        requester = %requester_email,
        subject = %payload.subject,
        "Help request accepted"
    );

    Ok(Json(RespondResponse {
        success: true,
        message: "You're now connected! Start chatting.".to_string(),
        chat_partner: Some(requester_email),
    }))
}

/// Fetch the caller's profile, requiring a completed one.
async fn require_named_user(state: &AppState, email: &str) -> Result<User> {
    let me = state
        .db
        .get_user(email)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", email)))?;
    if !me.profile_complete {
        return Err(AppError::BadRequest(
            "Please complete your profile first.".to_string(),
        ));
    }
    Ok(me)
}

/// Display name: the chosen username, falling back to the first name.
fn display_name(user: &User) -> String {
    user.username.clone().unwrap_or_else(|| user.name.clone())
}
