// SPDX-License-Identifier: MIT

//! Server-side login sessions.

use serde::{Deserialize, Serialize};

/// A login session stored in Firestore, keyed by its random hex ID.
///
/// Sessions are opaque: logout deletes the document, which invalidates
/// the cookie immediately. Expired sessions are removed lazily on lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Random 256-bit hex session ID (also the document ID)
    pub session_id: String,
    /// Owning user's email (lowercase)
    pub email: String,
    /// When the session was created (RFC 3339)
    pub created_at: String,
    /// When the session expires (RFC 3339)
    pub expires_at: String,
}
