// SPDX-License-Identifier: MIT

//! Roster allow-list loading and one-time consumption.
//!
//! The roster is a JSON file listing who may register. It is loaded once
//! at startup and rewritten whenever an entry is consumed, so a restart
//! cannot resurrect a used roster ID.

use crate::models::{Roster, RosterEntry};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

/// Service guarding the registration allow-list.
pub struct RosterService {
    /// None means in-memory only (tests); consumption is not persisted.
    path: Option<PathBuf>,
    roster: RwLock<Roster>,
}

impl RosterService {
    /// Load the roster from a JSON file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, RosterError> {
        let json_data = std::fs::read_to_string(path.as_ref())
            .map_err(|e| RosterError::Io(e.to_string()))?;
        let roster: Roster =
            serde_json::from_str(&json_data).map_err(|e| RosterError::Parse(e.to_string()))?;

        tracing::info!(
            count = roster.students.len(),
            path = %path.as_ref().display(),
            "Loaded roster"
        );

        Ok(Self {
            path: Some(path.as_ref().to_path_buf()),
            roster: RwLock::new(roster),
        })
    }

    /// Build an in-memory roster (tests).
    pub fn new_in_memory(roster: Roster) -> Self {
        Self {
            path: None,
            roster: RwLock::new(roster),
        }
    }

    /// Look up an unused roster entry by ID.
    pub async fn lookup(&self, roster_id: &str) -> Result<RosterEntry, RosterError> {
        let roster = self.roster.read().await;
        let entry = roster
            .students
            .iter()
            .find(|s| s.roster_id == roster_id)
            .ok_or(RosterError::Unknown)?;

        if entry.used {
            return Err(RosterError::AlreadyUsed);
        }
        Ok(entry.clone())
    }

    /// Check that a claimed name matches the roster entry, case-insensitively.
    pub async fn verify_name(
        &self,
        roster_id: &str,
        first_name: &str,
        surname: &str,
    ) -> Result<(), RosterError> {
        let entry = self.lookup(roster_id).await?;

        let matches = entry.first_name.to_lowercase() == first_name.trim().to_lowercase()
            && entry.surname.to_lowercase() == surname.trim().to_lowercase();

        if !matches {
            return Err(RosterError::NameMismatch {
                first_name: entry.first_name,
                surname: entry.surname,
            });
        }
        Ok(())
    }

    /// Mark a roster entry as used and persist the file.
    ///
    /// Holds the write lock across the file write so two concurrent
    /// registrations cannot both consume the same entry.
    pub async fn consume(&self, roster_id: &str) -> Result<RosterEntry, RosterError> {
        let mut roster = self.roster.write().await;
        let entry = roster
            .students
            .iter_mut()
            .find(|s| s.roster_id == roster_id)
            .ok_or(RosterError::Unknown)?;

        if entry.used {
            return Err(RosterError::AlreadyUsed);
        }
        entry.used = true;
        let consumed = entry.clone();

        if let Some(path) = &self.path {
            let json = serde_json::to_string_pretty(&*roster)
                .map_err(|e| RosterError::Io(e.to_string()))?;
            if let Err(e) = tokio::fs::write(path, json).await {
                // Roll back the in-memory flag so state and file stay in sync
                if let Some(entry) = roster
                    .students
                    .iter_mut()
                    .find(|s| s.roster_id == roster_id)
                {
                    entry.used = false;
                }
                return Err(RosterError::Io(e.to_string()));
            }
        }

        tracing::info!(roster_id = %roster_id, "Roster entry consumed");
        Ok(consumed)
    }
}

/// Errors from roster operations.
#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    #[error("This roster ID is not found in our records")]
    Unknown,

    #[error("This roster ID has already been registered; each ID can only be used once")]
    AlreadyUsed,

    #[error("This roster ID is only valid for {first_name} {surname}")]
    NameMismatch { first_name: String, surname: String },

    #[error("Failed to read or write roster file: {0}")]
    Io(String),

    #[error("Failed to parse roster file: {0}")]
    Parse(String),
}

impl From<RosterError> for crate::error::AppError {
    fn from(err: RosterError) -> Self {
        match &err {
            RosterError::Unknown => crate::error::AppError::NotFound(err.to_string()),
            RosterError::AlreadyUsed => crate::error::AppError::Conflict(err.to_string()),
            RosterError::NameMismatch { .. } => crate::error::AppError::BadRequest(err.to_string()),
            RosterError::Io(msg) | RosterError::Parse(msg) => {
                crate::error::AppError::Database(msg.clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_roster() -> Roster {
        Roster {
            students: vec![
                RosterEntry {
                    roster_id: "100001".to_string(),
                    first_name: "Ana".to_string(),
                    surname: "Cruz".to_string(),
                    grade: Some("10".to_string()),
                    section: Some("A".to_string()),
                    used: false,
                    is_admin: false,
                },
                RosterEntry {
                    roster_id: "100002".to_string(),
                    first_name: "Ben".to_string(),
                    surname: "Reyes".to_string(),
                    grade: Some("10".to_string()),
                    section: Some("A".to_string()),
                    used: true,
                    is_admin: false,
                },
            ],
        }
    }

    #[tokio::test]
    async fn test_lookup_rules() {
        let roster = RosterService::new_in_memory(sample_roster());

        assert!(roster.lookup("100001").await.is_ok());
        assert!(matches!(
            roster.lookup("999999").await,
            Err(RosterError::Unknown)
        ));
        assert!(matches!(
            roster.lookup("100002").await,
            Err(RosterError::AlreadyUsed)
        ));
    }

    #[tokio::test]
    async fn test_name_check_is_case_insensitive() {
        let roster = RosterService::new_in_memory(sample_roster());

        assert!(roster.verify_name("100001", "  ana ", "CRUZ").await.is_ok());
        assert!(matches!(
            roster.verify_name("100001", "Ana", "Santos").await,
            Err(RosterError::NameMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_consume_is_one_time() {
        let roster = RosterService::new_in_memory(sample_roster());

        let entry = roster.consume("100001").await.unwrap();
        assert_eq!(entry.first_name, "Ana");
        assert!(matches!(
            roster.consume("100001").await,
            Err(RosterError::AlreadyUsed)
        ));
        assert!(matches!(
            roster.lookup("100001").await,
            Err(RosterError::AlreadyUsed)
        ));
    }
}
