// SPDX-License-Identifier: MIT

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profiles, embedded notifications and quizzes)
//! - Sessions (opaque login sessions)
//! - Messages (persisted chat history)
//! - Chat sessions (open/closed tutoring pairs)
//! - Activity log (admin audit trail)
//! - Todos (personal study lists)

use crate::db::collections;
use crate::error::AppError;
use crate::models::{ActivityLogEntry, ChatMessage, ChatSession, Notification, Session, TodoList, User};
use crate::time_utils::format_utc_rfc3339;
use futures_util::{stream, StreamExt};

const MAX_CONCURRENT_DB_OPS: usize = 50;

/// Cursor into a conversation's message history.
///
/// Messages are ordered by (sent_at, id) descending; the cursor names the
/// last document of the previous page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageQueryCursor<'a> {
    pub sent_at: &'a str,
    pub message_id: &'a str,
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by their lowercased email (the document ID).
    pub async fn get_user(&self, email: &str) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(email)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or update a user.
    pub async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.email)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Find a user by their display username (lowercased).
    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let username = username.to_lowercase();
        let matches: Vec<User> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(move |q| q.field("username").eq(username.clone()))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(matches.into_iter().next())
    }

    /// List every user except the given one.
    ///
    /// Used for help-request fan-out; the user base is a single school
    /// roster, so the full scan stays small.
    pub async fn list_other_users(&self, exclude_email: &str) -> Result<Vec<User>, AppError> {
        let users: Vec<User> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(users.into_iter().filter(|u| u.email != exclude_email).collect())
    }

    /// List all non-admin users (admin directory view).
    pub async fn list_non_admin_users(&self) -> Result<Vec<User>, AppError> {
        let users: Vec<User> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(users.into_iter().filter(|u| !u.is_admin).collect())
    }

    /// Fetch a batch of users by email, concurrently.
    ///
    /// Emails are document IDs, so this is a set of point reads with
    /// bounded concurrency rather than an `IN` query.
    pub async fn get_users_by_emails(&self, emails: &[String]) -> Result<Vec<User>, AppError> {
        let results: Vec<Result<Option<User>, AppError>> = stream::iter(emails.to_vec())
            .map(|email| async move { self.get_user(&email).await })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect()
            .await;

        let mut users = Vec::with_capacity(emails.len());
        for result in results {
            if let Some(user) = result? {
                users.push(user);
            }
        }
        Ok(users)
    }

    /// Candidate partners for matching: completed profiles in the same
    /// grade and section, excluding the requesting user.
    pub async fn list_matching_candidates(
        &self,
        exclude_email: &str,
        grade: &str,
        section: &str,
    ) -> Result<Vec<User>, AppError> {
        let grade = grade.to_string();
        let section = section.to_string();
        let users: Vec<User> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(move |q| {
                q.for_all([
                    q.field("grade").eq(grade.clone()),
                    q.field("section").eq(section.clone()),
                    q.field("profile_complete").eq(true),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(users.into_iter().filter(|u| u.email != exclude_email).collect())
    }

    /// Append a notification to a user's embedded list.
    ///
    /// Fetch-modify-write; last writer wins, which matches the original
    /// system's semantics for this low-contention list.
    pub async fn push_notification(
        &self,
        email: &str,
        notification: Notification,
    ) -> Result<(), AppError> {
        let mut user = self
            .get_user(email)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", email)))?;
        user.notifications.push(notification);
        self.upsert_user(&user).await
    }

    /// Remove a notification by ID from a user's embedded list.
    pub async fn remove_notification(&self, email: &str, id: &str) -> Result<(), AppError> {
        let mut user = self
            .get_user(email)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", email)))?;
        user.notifications.retain(|n| n.id != id);
        self.upsert_user(&user).await
    }

    // ─── Session Operations ──────────────────────────────────────

    /// Look up a session by ID, deleting it lazily if expired.
    pub async fn get_session(&self, session_id: &str) -> Result<Option<Session>, AppError> {
        let session: Option<Session> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::SESSIONS)
            .obj()
            .one(session_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let Some(session) = session else {
            return Ok(None);
        };

        let now = format_utc_rfc3339(chrono::Utc::now());
        if session.expires_at <= now {
            tracing::debug!(email = %session.email, "Session expired, removing");
            self.delete_session(session_id).await?;
            return Ok(None);
        }

        Ok(Some(session))
    }

    /// Store a session document.
    pub async fn put_session(&self, session: &Session) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::SESSIONS)
            .document_id(&session.session_id)
            .object(session)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete a session (logout or lazy expiry).
    pub async fn delete_session(&self, session_id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::SESSIONS)
            .document_id(session_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Message Operations ──────────────────────────────────────

    /// Persist a chat message.
    pub async fn insert_message(&self, message: &ChatMessage) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::MESSAGES)
            .document_id(&message.id)
            .object(message)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Page through a conversation's messages, newest first.
    pub async fn conversation_messages(
        &self,
        conversation_id: &str,
        cursor: Option<MessageQueryCursor<'_>>,
        limit: u32,
    ) -> Result<Vec<ChatMessage>, AppError> {
        let conversation_id = conversation_id.to_string();
        let query = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::MESSAGES)
            .filter(move |q| q.field("conversation_id").eq(conversation_id.clone()))
            .order_by([
                ("sent_at", firestore::FirestoreQueryDirection::Descending),
                ("id", firestore::FirestoreQueryDirection::Descending),
            ]);

        let query = if let Some(cursor) = cursor {
            query.start_at(firestore::FirestoreQueryCursor::AfterValue(vec![
                cursor.sent_at.into(),
                cursor.message_id.into(),
            ]))
        } else {
            query
        };

        query
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All messages the user has sent or received.
    ///
    /// Used to derive the conversation partner list; per-partner volume is
    /// small in this deployment.
    pub async fn messages_involving(&self, email: &str) -> Result<Vec<ChatMessage>, AppError> {
        let email = email.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::MESSAGES)
            .filter(move |q| {
                q.for_any([
                    q.field("from").eq(email.clone()),
                    q.field("to").eq(email.clone()),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// The most recent message in a conversation, if any.
    pub async fn latest_message(
        &self,
        conversation_id: &str,
    ) -> Result<Option<ChatMessage>, AppError> {
        let messages = self.conversation_messages(conversation_id, None, 1).await?;
        Ok(messages.into_iter().next())
    }

    // ─── Chat Session Operations ─────────────────────────────────

    /// Store a chat session document.
    pub async fn upsert_chat_session(&self, session: &ChatSession) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::CHAT_SESSIONS)
            .document_id(&session.id)
            .object(session)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Chat sessions involving the user, filtered by active flag.
    pub async fn chat_sessions_for(
        &self,
        email: &str,
        active: bool,
    ) -> Result<Vec<ChatSession>, AppError> {
        let email = email.to_string();
        let sessions: Vec<ChatSession> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::CHAT_SESSIONS)
            .filter(move |q| {
                q.for_all([
                    q.field("active").eq(active),
                    q.for_any([
                        q.field("requester").eq(email.clone()),
                        q.field("helper").eq(email.clone()),
                    ]),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(sessions)
    }

    /// The active session between two users, if one exists.
    pub async fn find_active_chat_between(
        &self,
        a: &str,
        b: &str,
    ) -> Result<Option<ChatSession>, AppError> {
        let sessions = self.chat_sessions_for(a, true).await?;
        Ok(sessions.into_iter().find(|s| s.involves(b)))
    }

    /// All closed sessions (admin helper rankings).
    pub async fn closed_chat_sessions(&self) -> Result<Vec<ChatSession>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::CHAT_SESSIONS)
            .filter(|q| q.field("active").eq(false))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Activity Log Operations ─────────────────────────────────

    /// Append an audit event.
    pub async fn insert_activity(&self, entry: &ActivityLogEntry) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::ACTIVITY_LOG)
            .document_id(&entry.id)
            .object(entry)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Most recent audit events, newest first.
    pub async fn recent_activity(&self, limit: u32) -> Result<Vec<ActivityLogEntry>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::ACTIVITY_LOG)
            .order_by([("logged_at", firestore::FirestoreQueryDirection::Descending)])
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Todo Operations ─────────────────────────────────────────

    /// All to-do lists owned by the user.
    pub async fn todos_for(&self, owner: &str) -> Result<Vec<TodoList>, AppError> {
        let owner = owner.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::TODOS)
            .filter(move |q| q.field("owner").eq(owner.clone()))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Store a to-do list.
    pub async fn insert_todo(&self, todo: &TodoList) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::TODOS)
            .document_id(&todo.id)
            .object(todo)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete a to-do list, verifying ownership first.
    ///
    /// Returns false if the list does not exist or belongs to someone else.
    pub async fn delete_todo(&self, id: &str, owner: &str) -> Result<bool, AppError> {
        let todo: Option<TodoList> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::TODOS)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        match todo {
            Some(t) if t.owner == owner => {
                self.get_client()?
                    .fluent()
                    .delete()
                    .from(collections::TODOS)
                    .document_id(id)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
