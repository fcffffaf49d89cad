// SPDX-License-Identifier: MIT

//! Profile routes for authenticated users.

use axum::{
    extract::State,
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::services::matching::{score_partners, weeks_since, PartnerScore, MAX_RECOMMENDATIONS};
use crate::services::password::{hash_password, verify_password};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route("/api/profile", put(complete_profile))
        .route("/api/subjects", put(update_subjects))
        .route("/api/password", post(change_password))
        .route("/api/recommendations", get(get_recommendations))
}

// ─── Current User ────────────────────────────────────────────

/// Current user response. Never includes the password hash.
#[derive(Serialize)]
pub struct ProfileResponse {
    pub email: String,
    pub name: String,
    pub surname: String,
    pub username: Option<String>,
    pub grade: Option<String>,
    pub section: Option<String>,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub profile_complete: bool,
    pub is_admin: bool,
    pub created_at: String,
}

/// Get current user profile.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ProfileResponse>> {
    let profile = state
        .db
        .get_user(&user.email)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.email)))?;

    Ok(Json(ProfileResponse {
        email: profile.email,
        name: profile.name,
        surname: profile.surname,
        username: profile.username,
        grade: profile.grade,
        section: profile.section,
        strengths: profile.strengths,
        weaknesses: profile.weaknesses,
        profile_complete: profile.profile_complete,
        is_admin: profile.is_admin,
        created_at: profile.created_at,
    }))
}

// ─── Profile Completion ──────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct CompleteProfileRequest {
    #[validate(length(min = 3, max = 20, message = "Username must be 3-20 characters"))]
    pub username: String,
}

#[derive(Serialize)]
pub struct UpdateResponse {
    pub success: bool,
    pub message: String,
}

/// Finish profile setup by choosing a username.
async fn complete_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CompleteProfileRequest>,
) -> Result<Json<UpdateResponse>> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let username = payload.username.trim().to_lowercase();

    if let Some(existing) = state.db.find_user_by_username(&username).await? {
        if existing.email != user.email {
            return Err(AppError::Conflict("Username is already taken.".to_string()));
        }
    }

    let mut profile = state
        .db
        .get_user(&user.email)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.email)))?;

    profile.username = Some(username);
    profile.profile_complete = true;
    state.db.upsert_user(&profile).await?;

    tracing::info!(email = %user.email, "Profile completed");
    Ok(Json(UpdateResponse {
        success: true,
        message: "Profile saved successfully!".to_string(),
    }))
}

// ─── Subjects ────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct UpdateSubjectsRequest {
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
}

/// Update strength/weakness subject lists.
async fn update_subjects(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<UpdateSubjectsRequest>,
) -> Result<Json<UpdateResponse>> {
    let mut profile = state
        .db
        .get_user(&user.email)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.email)))?;

    profile.strengths = payload.strengths;
    profile.weaknesses = payload.weaknesses;
    state.db.upsert_user(&profile).await?;

    Ok(Json(UpdateResponse {
        success: true,
        message: "Profile updated successfully!".to_string(),
    }))
}

// ─── Password Change ─────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

/// Change password, verifying the current one first.
async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<UpdateResponse>> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let mut profile = state
        .db
        .get_user(&user.email)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.email)))?;

    if !verify_password(&payload.current_password, &profile.password) {
        return Err(AppError::Unauthorized);
    }

    profile.password = hash_password(&payload.new_password)?;
    state.db.upsert_user(&profile).await?;

    tracing::info!(email = %user.email, "Password changed");
    Ok(Json(UpdateResponse {
        success: true,
        message: "Password changed successfully.".to_string(),
    }))
}

// ─── Recommendations ─────────────────────────────────────────

#[derive(Serialize)]
pub struct RecommendationsResponse {
    pub success: bool,
    pub recommendations: Vec<PartnerScore>,
    pub weeks_active: i64,
    pub message: String,
}

/// Weekly study partner recommendations.
///
/// Gated on one full week of membership, then a linear scan over
/// completed profiles in the same grade and section.
async fn get_recommendations(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<RecommendationsResponse>> {
    let me = state
        .db
        .get_user(&user.email)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.email)))?;

    let weeks_active = weeks_since(&me.created_at, chrono::Utc::now());
    if weeks_active < 1 {
        return Ok(Json(RecommendationsResponse {
            success: true,
            recommendations: vec![],
            weeks_active,
            message: "Check back next week for your study partner recommendations!".to_string(),
        }));
    }

    let (Some(grade), Some(section)) = (me.grade.clone(), me.section.clone()) else {
        // Admin accounts have no grade/section and get no recommendations
        return Ok(Json(RecommendationsResponse {
            success: true,
            recommendations: vec![],
            weeks_active,
            message: "No compatible study partners found yet. Try updating your subjects!"
                .to_string(),
        }));
    };

    let candidates = state
        .db
        .list_matching_candidates(&me.email, &grade, &section)
        .await?;

    let recommendations = score_partners(&me, &candidates, MAX_RECOMMENDATIONS);

    let message = if recommendations.is_empty() {
        "No compatible study partners found yet. Try updating your subjects!".to_string()
    } else {
        format!(
            "Found {} recommended study partners for you!",
            recommendations.len()
        )
    };

    Ok(Json(RecommendationsResponse {
        success: true,
        recommendations,
        weeks_active,
        message,
    }))
}
