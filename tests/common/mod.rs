// SPDX-License-Identifier: MIT

use std::sync::Arc;
use studymatch::config::Config;
use studymatch::db::FirestoreDb;
use studymatch::models::{Roster, RosterEntry};
use studymatch::routes::create_router;
use studymatch::services::{MailerService, PresenceRegistry, RosterService, VerificationService};
use studymatch::AppState;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// A small in-memory roster for registration tests.
#[allow(dead_code)]
pub fn test_roster() -> RosterService {
    RosterService::new_in_memory(Roster {
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
    })
}

/// Create a test app with offline mock dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with_frontend_url("http://localhost:5173")
}

/// Same, with a specific frontend URL (drives the cookie Secure flag).
#[allow(dead_code)]
pub fn create_test_app_with_frontend_url(frontend_url: &str) -> (axum::Router, Arc<AppState>) {
    let mut config = Config::test_default();
    config.frontend_url = frontend_url.to_string();

    let db = test_db_offline();
    let mailer = MailerService::new(config.sendgrid_api_key.clone(), config.mail_from.clone());

    let state = Arc::new(AppState {
        config,
        db,
        roster: test_roster(),
        mailer,
        verification: VerificationService::new(),
        presence: Arc::new(PresenceRegistry::new()),
    });

    (create_router(state.clone()), state)
}
