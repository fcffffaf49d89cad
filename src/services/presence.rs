// SPDX-License-Identifier: MIT

//! In-memory presence registry for WebSocket connections.
//!
//! One entry per connected user, holding profile details for the
//! active-users view and a channel to the connection's writer task.
//! Delivery is best-effort: the document store is the source of truth,
//! a dropped frame just means the client refetches on next load.

use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::models::Notification;

/// Events pushed to connected clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsEvent {
    /// A chat message (delivered to recipient and echoed to sender)
    Message {
        from: String,
        from_email: String,
        body: String,
        sent_at: String,
    },
    /// A persisted notification, pushed in real time
    Notification { notification: Notification },
    /// Another user connected or disconnected
    Presence { email: String, online: bool },
    /// The partner closed the chat session
    ChatClosed { partner: String },
}

/// Profile snapshot of a connected user.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectedUser {
    pub email: String,
    pub username: Option<String>,
    pub grade: Option<String>,
    pub section: Option<String>,
    pub connected_at: String,
}

struct PresenceEntry {
    info: ConnectedUser,
    sender: mpsc::UnboundedSender<WsEvent>,
}

/// Registry of currently connected users, keyed by lowercased email.
///
/// A reconnect replaces the previous entry, so the stale connection's
/// writer channel is dropped and its task winds down.
#[derive(Default)]
pub struct PresenceRegistry {
    users: DashMap<String, PresenceEntry>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection, returning its event receiver half's sender.
    pub fn register(&self, info: ConnectedUser, sender: mpsc::UnboundedSender<WsEvent>) {
        let email = info.email.clone();
        self.users.insert(email, PresenceEntry { info, sender });
    }

    /// Remove a connection, but only if it still owns the registry entry.
    ///
    /// A reconnect replaces the entry, so a stale connection's teardown
    /// must not evict the live one. Returns true if this connection's
    /// entry was removed.
    pub fn unregister(&self, email: &str, sender: &mpsc::UnboundedSender<WsEvent>) -> bool {
        self.users
            .remove_if(email, |_, entry| entry.sender.same_channel(sender))
            .is_some()
    }

    /// Whether a user currently has a live connection.
    pub fn is_online(&self, email: &str) -> bool {
        self.users.contains_key(email)
    }

    /// Send an event to one user, if connected. Returns delivery status.
    pub fn send_to(&self, email: &str, event: WsEvent) -> bool {
        match self.users.get(email) {
            Some(entry) => entry.sender.send(event).is_ok(),
            None => false,
        }
    }

    /// Broadcast an event to every connected user.
    pub fn broadcast(&self, event: WsEvent) {
        for entry in self.users.iter() {
            // Closed channels are cleaned up when the connection unregisters
            let _ = entry.sender.send(event.clone());
        }
    }

    /// Snapshot of connected users for the active-users views.
    pub fn snapshot(&self) -> Vec<ConnectedUser> {
        self.users.iter().map(|e| e.info.clone()).collect()
    }
}
