// SPDX-License-Identifier: MIT

//! User model for storage and API.

use crate::models::study::Quiz;
use serde::{Deserialize, Serialize};

/// User profile stored in Firestore, keyed by lowercased email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Email address (also used as document ID, always lowercase)
    pub email: String,
    /// First name (from the roster entry)
    pub name: String,
    /// Surname (from the roster entry)
    pub surname: String,
    /// Display username, chosen during profile setup
    pub username: Option<String>,
    /// Roster ID consumed at registration
    pub roster_id: Option<String>,
    /// Grade level (None for admin accounts)
    pub grade: Option<String>,
    /// Class section (None for admin accounts)
    pub section: Option<String>,
    /// PBKDF2 password hash
    pub password: PasswordHash,
    /// Subjects the user is confident in
    #[serde(default)]
    pub strengths: Vec<String>,
    /// Subjects the user wants help with
    #[serde(default)]
    pub weaknesses: Vec<String>,
    /// Whether profile setup has been completed
    pub profile_complete: bool,
    /// Admin accounts see roster-wide views and skip grade/section
    #[serde(default)]
    pub is_admin: bool,
    /// When the account was created (RFC 3339)
    pub created_at: String,
    /// Pending notifications, embedded on the user document
    #[serde(default)]
    pub notifications: Vec<Notification>,
    /// Saved flashcard decks
    #[serde(default)]
    pub quizzes: Vec<Quiz>,
}

/// Salted PBKDF2-HMAC-SHA256 password hash (hex-encoded).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordHash {
    pub salt: String,
    pub hash: String,
}

/// A notification delivered to a user (persisted, with best-effort
/// real-time push on top).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Random hex ID, used to remove the notification once answered
    pub id: String,
    /// Notification kind ("help_request" or "request_accepted")
    pub kind: String,
    /// Who triggered the notification
    pub from: NotificationSender,
    /// Subject the help request concerns
    pub subject: String,
    /// Human-readable message
    pub message: String,
    /// Optional frontend redirect (used when a request is accepted)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    /// When the notification was created (RFC 3339)
    pub created_at: String,
}

/// Sender details embedded in a notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationSender {
    pub username: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
}
