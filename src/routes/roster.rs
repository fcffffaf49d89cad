// SPDX-License-Identifier: MIT

//! Roster lookup and username availability routes (pre-registration).

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/roster/lookup", post(lookup))
        .route("/roster/check", post(check_name))
        .route("/username/check", post(check_username))
}

#[derive(Deserialize)]
pub struct RosterLookupRequest {
    pub roster_id: String,
}

#[derive(Serialize)]
pub struct RosterLookupResponse {
    pub success: bool,
    pub student: RosterStudent,
}

#[derive(Serialize)]
pub struct RosterStudent {
    pub first_name: String,
    pub surname: String,
    pub roster_id: String,
    pub grade: Option<String>,
    pub section: Option<String>,
    pub is_admin: bool,
}

/// Return the roster entry for an unused roster ID, so the signup form
/// can be prefilled.
async fn lookup(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RosterLookupRequest>,
) -> Result<Json<RosterLookupResponse>> {
    if payload.roster_id.trim().is_empty() {
        return Err(AppError::BadRequest("Roster ID is required.".to_string()));
    }

    let entry = state.roster.lookup(payload.roster_id.trim()).await?;

    Ok(Json(RosterLookupResponse {
        success: true,
        student: RosterStudent {
            first_name: entry.first_name,
            surname: entry.surname,
            roster_id: entry.roster_id,
            grade: entry.grade,
            section: entry.section,
            is_admin: entry.is_admin,
        },
    }))
}

#[derive(Deserialize)]
pub struct RosterCheckRequest {
    pub roster_id: String,
    pub first_name: String,
    pub surname: String,
}

#[derive(Serialize)]
pub struct RosterCheckResponse {
    pub success: bool,
}

/// Validate that a claimed name matches the roster entry.
async fn check_name(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RosterCheckRequest>,
) -> Result<Json<RosterCheckResponse>> {
    if payload.first_name.trim().is_empty() || payload.surname.trim().is_empty() {
        return Err(AppError::BadRequest(
            "First name and surname are required.".to_string(),
        ));
    }

    state
        .roster
        .verify_name(
            payload.roster_id.trim(),
            &payload.first_name,
            &payload.surname,
        )
        .await?;

    Ok(Json(RosterCheckResponse { success: true }))
}

#[derive(Deserialize)]
pub struct UsernameCheckRequest {
    pub username: String,
}

#[derive(Serialize)]
pub struct UsernameCheckResponse {
    pub available: bool,
    pub message: String,
}

/// Check username availability.
async fn check_username(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<UsernameCheckRequest>,
) -> Result<Json<UsernameCheckResponse>> {
    let username = payload.username.trim().to_lowercase();
    if username.is_empty() {
        return Err(AppError::BadRequest("Username is required.".to_string()));
    }

    let taken = state.db.find_user_by_username(&username).await?.is_some();

    Ok(Json(if taken {
        UsernameCheckResponse {
            available: false,
            message: "Username is already taken.".to_string(),
        }
    } else {
        UsernameCheckResponse {
            available: true,
            message: "Username is available.".to_string(),
        }
    }))
}
