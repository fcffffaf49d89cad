// SPDX-License-Identifier: MIT

//! Roster allow-list gating registration.

use serde::{Deserialize, Serialize};

/// The on-disk roster file: the set of students allowed to register.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Roster {
    pub students: Vec<RosterEntry>,
}

/// One roster entry. Each roster ID can be used to register exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterEntry {
    /// Learner reference number, the one-time registration code
    pub roster_id: String,
    pub first_name: String,
    pub surname: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    /// Set once the entry has been consumed by a registration
    #[serde(default)]
    pub used: bool,
    /// Admin entries skip grade/section on their profile
    #[serde(default)]
    pub is_admin: bool,
}
