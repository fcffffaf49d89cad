// SPDX-License-Identifier: MIT

//! StudyMatch: peer tutoring and study-partner matching backend.
//!
//! This crate provides the API for roster-gated registration, partner
//! matching by subject strengths/weaknesses, help-request broadcasting,
//! and real-time chat between matched students.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::{MailerService, PresenceRegistry, RosterService, VerificationService};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub roster: RosterService,
    pub mailer: MailerService,
    pub verification: VerificationService,
    pub presence: Arc<PresenceRegistry>,
}
