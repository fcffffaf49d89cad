// SPDX-License-Identifier: MIT

//! Admin-only views: user directory, presence, audit log, rankings.

use axum::{extract::State, routing::get, Extension, Json, Router};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{ActivityLogEntry, User};
use crate::services::presence::ConnectedUser;
use crate::AppState;

const ACTIVITY_LOG_LIMIT: u32 = 100;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin/users", get(list_users))
        .route("/admin/active-users", get(list_active_users))
        .route("/admin/activity-log", get(activity_log))
        .route("/admin/rankings", get(helper_rankings))
}

/// Fetch the caller and reject non-admins.
async fn require_admin(state: &AppState, email: &str) -> Result<User> {
    let user = state
        .db
        .get_user(email)
        .await?
        .ok_or(AppError::Unauthorized)?;
    if !user.is_admin {
        return Err(AppError::Forbidden);
    }
    Ok(user)
}

// ─── User Directory ──────────────────────────────────────────

#[derive(Serialize)]
pub struct AdminUserView {
    pub email: String,
    pub name: String,
    pub surname: String,
    pub username: Option<String>,
    pub grade: Option<String>,
    pub section: Option<String>,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub profile_complete: bool,
    pub created_at: String,
}

#[derive(Serialize)]
pub struct AdminUsersResponse {
    pub success: bool,
    pub users: Vec<AdminUserView>,
}

/// All registered students (admins excluded).
async fn list_users(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<AdminUsersResponse>> {
    require_admin(&state, &user.email).await?;

    let mut users: Vec<AdminUserView> = state
        .db
        .list_non_admin_users()
        .await?
        .into_iter()
        .map(|u| AdminUserView {
            email: u.email,
            name: u.name,
            surname: u.surname,
            username: u.username,
            grade: u.grade,
            section: u.section,
            strengths: u.strengths,
            weaknesses: u.weaknesses,
            profile_complete: u.profile_complete,
            created_at: u.created_at,
        })
        .collect();
    users.sort_by(|a, b| a.surname.cmp(&b.surname));

    Ok(Json(AdminUsersResponse {
        success: true,
        users,
    }))
}

// ─── Presence ────────────────────────────────────────────────

#[derive(Serialize)]
pub struct AdminActiveUsersResponse {
    pub success: bool,
    pub users: Vec<ConnectedUser>,
    pub count: usize,
}

/// Currently connected students.
async fn list_active_users(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<AdminActiveUsersResponse>> {
    let admin = require_admin(&state, &user.email).await?;

    let users: Vec<ConnectedUser> = state
        .presence
        .snapshot()
        .into_iter()
        .filter(|u| u.email != admin.email)
        .collect();
    let count = users.len();

    Ok(Json(AdminActiveUsersResponse {
        success: true,
        users,
        count,
    }))
}

// ─── Activity Log ────────────────────────────────────────────

#[derive(Serialize)]
pub struct ActivityLogResponse {
    pub success: bool,
    pub entries: Vec<ActivityLogEntry>,
}

/// Most recent audit events, newest first.
async fn activity_log(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ActivityLogResponse>> {
    require_admin(&state, &user.email).await?;

    let entries = state.db.recent_activity(ACTIVITY_LOG_LIMIT).await?;
    Ok(Json(ActivityLogResponse {
        success: true,
        entries,
    }))
}

// ─── Rankings ────────────────────────────────────────────────

#[derive(Serialize)]
pub struct HelperRanking {
    pub email: String,
    pub username: Option<String>,
    pub sessions_helped: usize,
}

#[derive(Serialize)]
pub struct RankingsResponse {
    pub success: bool,
    pub rankings: Vec<HelperRanking>,
}

/// Helpers ranked by how many closed sessions they ran.
async fn helper_rankings(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<RankingsResponse>> {
    require_admin(&state, &user.email).await?;

    let sessions = state.db.closed_chat_sessions().await?;

    let mut counts: HashMap<String, usize> = HashMap::new();
    for session in &sessions {
        *counts.entry(session.helper.clone()).or_default() += 1;
    }

    let emails: Vec<String> = counts.keys().cloned().collect();
    let helpers = state.db.get_users_by_emails(&emails).await?;
    let usernames: HashMap<&str, &Option<String>> = helpers
        .iter()
        .map(|u| (u.email.as_str(), &u.username))
        .collect();

    let mut rankings: Vec<HelperRanking> = counts
        .into_iter()
        .map(|(email, sessions_helped)| HelperRanking {
            username: usernames.get(email.as_str()).cloned().cloned().flatten(),
            email,
            sessions_helped,
        })
        .collect();
    rankings.sort_by(|a, b| {
        b.sessions_helped
            .cmp(&a.sessions_helped)
            .then_with(|| a.email.cmp(&b.email))
    });

    Ok(Json(RankingsResponse {
        success: true,
        rankings,
    }))
}
