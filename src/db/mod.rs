// SPDX-License-Identifier: MIT

//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

use crate::error::AppError;
use ring::rand::{SecureRandom, SystemRandom};

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const SESSIONS: &str = "sessions";
    pub const MESSAGES: &str = "messages";
    pub const CHAT_SESSIONS: &str = "chat_sessions";
    pub const ACTIVITY_LOG: &str = "activity_log";
    pub const TODOS: &str = "todos";
}

/// Generate a random hex ID of `bytes` entropy bytes.
///
/// Used for document IDs, session IDs, and notification IDs.
pub fn random_hex_id(bytes: usize) -> Result<String, AppError> {
    let rng = SystemRandom::new();
    let mut buf = vec![0u8; bytes];
    rng.fill(&mut buf)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("System RNG failure")))?;
    Ok(hex::encode(buf))
}
