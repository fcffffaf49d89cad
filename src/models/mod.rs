// SPDX-License-Identifier: MIT

//! Data models for the application.

pub mod activity;
pub mod chat;
pub mod roster;
pub mod session;
pub mod study;
pub mod user;

pub use activity::ActivityLogEntry;
pub use chat::{ChatMessage, ChatSession};
pub use roster::{Roster, RosterEntry};
pub use session::Session;
pub use study::{Quiz, TodoList};
pub use user::{Notification, NotificationSender, PasswordHash, User};
