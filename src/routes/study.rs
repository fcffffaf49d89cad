// SPDX-License-Identifier: MIT

//! Personal study tool routes: to-do lists and flashcard decks.

use axum::{
    extract::{Path, State},
    routing::{delete, get},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::db::random_hex_id;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::study::Flashcard;
use crate::models::{Quiz, TodoList};
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/todos", get(list_todos).post(create_todo))
        .route("/api/todos/{id}", delete(delete_todo))
        .route("/api/quizzes", get(list_quizzes).post(save_quiz))
}

// ─── Todos ───────────────────────────────────────────────────

#[derive(Serialize)]
pub struct TodosResponse {
    pub success: bool,
    pub todos: Vec<TodoList>,
}

async fn list_todos(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<TodosResponse>> {
    let mut todos = state.db.todos_for(&user.email).await?;
    todos.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(Json(TodosResponse {
        success: true,
        todos,
    }))
}

#[derive(Deserialize)]
pub struct CreateTodoPayload {
    pub title: String,
    #[serde(default)]
    pub items: Vec<String>,
}

#[derive(Serialize)]
pub struct CreateTodoResponse {
    pub success: bool,
    pub todo: TodoList,
}

async fn create_todo(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateTodoPayload>,
) -> Result<Json<CreateTodoResponse>> {
    let title = payload.title.trim().to_string();
    if title.is_empty() {
        return Err(AppError::BadRequest("Title is required.".to_string()));
    }

    let todo = TodoList {
        id: random_hex_id(16)?,
        owner: user.email.clone(),
        title,
        items: payload.items,
        created_at: format_utc_rfc3339(chrono::Utc::now()),
    };
    state.db.insert_todo(&todo).await?;

    Ok(Json(CreateTodoResponse {
        success: true,
        todo,
    }))
}

#[derive(Serialize)]
pub struct DeleteTodoResponse {
    pub success: bool,
}

/// Delete a to-do list. 404 covers both missing and not-owned, so the
/// response does not reveal other users' list IDs.
async fn delete_todo(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<DeleteTodoResponse>> {
    if !state.db.delete_todo(&id, &user.email).await? {
        return Err(AppError::NotFound("To-do list not found.".to_string()));
    }
    Ok(Json(DeleteTodoResponse { success: true }))
}

// ─── Quizzes ─────────────────────────────────────────────────

#[derive(Serialize)]
pub struct QuizzesResponse {
    pub success: bool,
    pub quizzes: Vec<Quiz>,
}

/// Saved flashcard decks (embedded on the user document).
async fn list_quizzes(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<QuizzesResponse>> {
    let me = state
        .db
        .get_user(&user.email)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.email)))?;

    Ok(Json(QuizzesResponse {
        success: true,
        quizzes: me.quizzes,
    }))
}

#[derive(Deserialize)]
pub struct SaveQuizPayload {
    pub folder_name: String,
    pub quiz_name: String,
    pub flashcards: Vec<Flashcard>,
}

#[derive(Serialize)]
pub struct SaveQuizResponse {
    pub success: bool,
    pub message: String,
}

/// Save a flashcard deck. Saving under an existing folder/name pair
/// replaces the previous deck.
async fn save_quiz(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<SaveQuizPayload>,
) -> Result<Json<SaveQuizResponse>> {
    let folder_name = payload.folder_name.trim().to_string();
    let quiz_name = payload.quiz_name.trim().to_string();
    if folder_name.is_empty() || quiz_name.is_empty() {
        return Err(AppError::BadRequest(
            "Folder name and quiz name are required.".to_string(),
        ));
    }
    if payload.flashcards.is_empty() {
        return Err(AppError::BadRequest(
            "A quiz needs at least one flashcard.".to_string(),
        ));
    }

    let mut me = state
        .db
        .get_user(&user.email)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.email)))?;

    me.quizzes
        .retain(|q| !(q.folder_name == folder_name && q.quiz_name == quiz_name));
    me.quizzes.push(Quiz {
        folder_name,
        quiz_name,
        flashcards: payload.flashcards,
        created_at: format_utc_rfc3339(chrono::Utc::now()),
    });
    state.db.upsert_user(&me).await?;

    Ok(Json(SaveQuizResponse {
        success: true,
        message: "Quiz saved!".to_string(),
    }))
}
