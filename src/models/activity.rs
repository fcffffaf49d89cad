// SPDX-License-Identifier: MIT

//! Activity log entries for the admin audit view.

use serde::{Deserialize, Serialize};

/// A single audit event, written whenever a help request is broadcast,
/// a helper volunteers, or a request is accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityLogEntry {
    /// Random hex document ID
    pub id: String,
    /// Event kind ("help_request", "helper_volunteered", "request_accepted")
    pub kind: String,
    /// Email of the user who triggered the event
    pub actor: String,
    /// Actor's display username at the time of the event
    pub actor_username: String,
    /// Subject the event concerns
    pub subject: String,
    /// Human-readable description
    pub description: String,
    /// When the event happened (RFC 3339)
    pub logged_at: String,
}
