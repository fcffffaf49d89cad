// SPDX-License-Identifier: MIT

//! Chat messages and chat sessions.

use serde::{Deserialize, Serialize};

/// A persisted chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Random hex document ID (stored in the document for cursor tie-breaks)
    pub id: String,
    /// Percent-encoded sorted email pair, e.g. "a%40x.test_b%40x.test"
    pub conversation_id: String,
    /// Sender email (lowercase)
    pub from: String,
    /// Recipient email (lowercase)
    pub to: String,
    /// Message body
    pub body: String,
    /// When the message was sent (RFC 3339)
    pub sent_at: String,
}

impl ChatMessage {
    /// Build the canonical conversation ID for a pair of users.
    ///
    /// Emails are sorted so both directions map to the same conversation,
    /// and percent-encoded so the ID is safe as a document field/ID.
    pub fn conversation_id(a: &str, b: &str) -> String {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        format!("{}_{}", urlencoding::encode(lo), urlencoding::encode(hi))
    }
}

/// An open or closed tutoring session between two users.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    /// Random hex document ID
    pub id: String,
    /// The user who asked for help
    pub requester: String,
    /// The user who volunteered
    pub helper: String,
    /// Subject the session concerns
    pub subject: String,
    /// False once either side closes the session
    pub active: bool,
    /// When the session was opened (RFC 3339)
    pub created_at: String,
    /// When the session was closed (RFC 3339)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<String>,
    /// Who closed the session
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_by: Option<String>,
}

impl ChatSession {
    /// The other participant, given one side of the session.
    pub fn partner_of(&self, email: &str) -> &str {
        if self.requester == email {
            &self.helper
        } else {
            &self.requester
        }
    }

    /// Whether the given user participates in this session.
    pub fn involves(&self, email: &str) -> bool {
        self.requester == email || self.helper == email
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversation_id_is_order_independent() {
        let a = ChatMessage::conversation_id("zoe@school.test", "ana@school.test");
        let b = ChatMessage::conversation_id("ana@school.test", "zoe@school.test");
        assert_eq!(a, b);
        assert!(a.starts_with("ana%40school.test_"));
    }

    #[test]
    fn test_partner_of() {
        let session = ChatSession {
            id: "abc".to_string(),
            requester: "a@x.test".to_string(),
            helper: "b@x.test".to_string(),
            subject: "Math".to_string(),
            active: true,
            created_at: String::new(),
            closed_at: None,
            closed_by: None,
        };
        assert_eq!(session.partner_of("a@x.test"), "b@x.test");
        assert_eq!(session.partner_of("b@x.test"), "a@x.test");
        assert!(session.involves("a@x.test"));
        assert!(!session.involves("c@x.test"));
    }
}
