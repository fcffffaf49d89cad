// SPDX-License-Identifier: MIT

//! StudyMatch API Server
//!
//! Matches students with study partners by subject strengths and
//! weaknesses, brokers help requests, and relays real-time chat.

use std::sync::Arc;
use studymatch::{
    config::Config,
    db::FirestoreDb,
    services::{MailerService, PresenceRegistry, RosterService, VerificationService},
    AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting StudyMatch API");

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.gcp_project_id)
        .await
        .expect("Failed to connect to Firestore");

    // Load the registration roster
    let roster =
        RosterService::load_from_file(&config.roster_path).expect("Failed to load roster");

    let mailer = MailerService::new(config.sendgrid_api_key.clone(), config.mail_from.clone());
    if !mailer.enabled() {
        tracing::warn!("SENDGRID_API_KEY not set; verification codes will be returned in-band");
    }

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        roster,
        mailer,
        verification: VerificationService::new(),
        presence: Arc::new(PresenceRegistry::new()),
    });

    // Build router
    let app = studymatch::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("studymatch=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
