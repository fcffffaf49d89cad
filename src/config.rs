// SPDX-License-Identifier: MIT

//! Application configuration loaded from environment variables.
//!
//! Everything is read once at startup; the SendGrid key is optional so the
//! server can run without outbound mail (verification codes are then
//! returned in-band, which the frontend surfaces as a notification).

use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frontend URL allowed for CORS and used in notification links
    pub frontend_url: String,
    /// GCP project ID for Firestore
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Path to the roster allow-list file gating registration
    pub roster_path: String,
    /// SendGrid API key; None disables outbound mail
    pub sendgrid_api_key: Option<String>,
    /// From address for verification emails
    pub mail_from: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            roster_path: env::var("ROSTER_PATH")
                .unwrap_or_else(|_| "data/roster.json".to_string()),
            sendgrid_api_key: env::var("SENDGRID_API_KEY")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            mail_from: env::var("MAIL_FROM").map_err(|_| ConfigError::Missing("MAIL_FROM"))?,
        })
    }

    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            roster_path: "data/roster.json".to_string(),
            sendgrid_api_key: None,
            mail_from: "noreply@studymatch.test".to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        env::set_var("MAIL_FROM", "noreply@example.com");
        env::remove_var("SENDGRID_API_KEY");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.mail_from, "noreply@example.com");
        assert_eq!(config.port, 8080);
        assert!(config.sendgrid_api_key.is_none());
    }
}
