// SPDX-License-Identifier: MIT

//! SendGrid mail client for verification codes.
//!
//! Thin wrapper over the SendGrid v3 API. When no API key is configured
//! (local development, tests) sends fail with `AppError::Mail`, and the
//! caller falls back to returning the code in-band.

use crate::error::AppError;

const SENDGRID_API_URL: &str = "https://api.sendgrid.com/v3/mail/send";

/// SendGrid mail client.
#[derive(Clone)]
pub struct MailerService {
    http: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    from: String,
}

impl MailerService {
    /// Create a mailer. `api_key = None` disables outbound mail.
    pub fn new(api_key: Option<String>, from: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: SENDGRID_API_URL.to_string(),
            api_key,
            from,
        }
    }

    /// Create a mailer pointed at a custom endpoint (tests).
    pub fn with_api_url(api_key: Option<String>, from: String, api_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url,
            api_key,
            from,
        }
    }

    /// Whether outbound mail is configured.
    pub fn enabled(&self) -> bool {
        self.api_key.is_some()
    }

    /// Send a verification code email.
    pub async fn send_verification_code(&self, to: &str, code: &str) -> Result<(), AppError> {
        let Some(api_key) = &self.api_key else {
            return Err(AppError::Mail("Outbound mail is not configured".to_string()));
        };

        let body = serde_json::json!({
            "personalizations": [{ "to": [{ "email": to }] }],
            "from": { "email": self.from },
            "subject": "Your StudyMatch Verification Code",
            "content": [{
                "type": "text/html",
                "value": verification_email_html(code),
            }],
        });

        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Mail(format!("SendGrid request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, detail = %detail, "SendGrid rejected mail");
            return Err(AppError::Mail(format!("SendGrid returned {}", status)));
        }

        tracing::info!(to = %to, "Verification email sent");
        Ok(())
    }
}

fn verification_email_html(code: &str) -> String {
    format!(
        "<div style=\"font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;\">\
           <h2>StudyMatch Verification Code</h2>\
           <p>Your verification code is:</p>\
           <div style=\"font-size: 32px; font-weight: bold; letter-spacing: 8px;\">{}</div>\
           <p>This code will expire in 10 minutes.</p>\
           <p>If you didn't request this code, please ignore this email.</p>\
         </div>",
        code
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_mailer_fails_with_mail_error() {
        let mailer = MailerService::new(None, "noreply@studymatch.test".to_string());
        assert!(!mailer.enabled());

        let err = mailer
            .send_verification_code("a@x.test", "123456")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Mail(_)));
    }

    #[test]
    fn test_email_body_contains_code() {
        let html = verification_email_html("424242");
        assert!(html.contains("424242"));
    }
}
