// SPDX-License-Identifier: MIT

//! Session cookie authentication middleware.
//!
//! Sessions are opaque random IDs backed by the `sessions` collection,
//! delivered in an HTTP-only cookie. Logout deletes the document, which
//! invalidates the cookie server-side immediately.

use crate::db::random_hex_id;
use crate::error::AppError;
use crate::models::Session;
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::sync::Arc;

/// Session cookie name.
pub const SESSION_COOKIE: &str = "studymatch_session";

/// Session lifetime.
pub const SESSION_TTL_DAYS: i64 = 30;

/// Authenticated user extracted from the session cookie.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub email: String,
}

/// Middleware that requires a valid session cookie.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(cookie) = jar.get(SESSION_COOKIE) else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    let session = state
        .db
        .get_session(cookie.value())
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let Some(session) = session else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    request.extensions_mut().insert(AuthUser {
        email: session.email,
    });

    Ok(next.run(request).await)
}

/// Create a session document and return the cookie to set.
pub async fn create_session(state: &AppState, email: &str) -> Result<Cookie<'static>, AppError> {
    let session_id = random_hex_id(32)?;
    let now = chrono::Utc::now();

    let session = Session {
        session_id: session_id.clone(),
        email: email.to_lowercase(),
        created_at: format_utc_rfc3339(now),
        expires_at: format_utc_rfc3339(now + chrono::Duration::days(SESSION_TTL_DAYS)),
    };
    state.db.put_session(&session).await?;

    tracing::info!(email = %session.email, "Session created");
    Ok(build_session_cookie(
        session_id,
        cookies_secure(&state.config.frontend_url),
    ))
}

/// Delete the session document (if any) and return the removal cookie.
pub async fn destroy_session(state: &AppState, jar: &CookieJar) -> Cookie<'static> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if let Err(e) = state.db.delete_session(cookie.value()).await {
            tracing::warn!(error = %e, "Failed to delete session document");
        }
    }
    build_removal_cookie(cookies_secure(&state.config.frontend_url))
}

/// Cookies are Secure unless the deployment fronts plain-HTTP localhost.
fn cookies_secure(frontend_url: &str) -> bool {
    frontend_url.starts_with("https://")
}

fn build_session_cookie(session_id: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, session_id))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::days(SESSION_TTL_DAYS))
        .build()
}

fn build_removal_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::ZERO)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = build_session_cookie("abc123".to_string(), false);
        let rendered = cookie.to_string();

        assert!(rendered.starts_with("studymatch_session=abc123"));
        assert!(rendered.contains("Path=/"));
        assert!(rendered.contains("HttpOnly"));
        assert!(rendered.contains("SameSite=Lax"));
        assert!(!rendered.contains("Secure"));
    }

    #[test]
    fn test_removal_cookie_expires_immediately() {
        let cookie = build_removal_cookie(true);
        let rendered = cookie.to_string();

        assert!(rendered.contains("Max-Age=0"));
        assert!(rendered.contains("Secure"));
    }

    #[test]
    fn test_secure_flag_follows_frontend_scheme() {
        assert!(cookies_secure("https://studymatch.example.org"));
        assert!(!cookies_secure("http://localhost:5173"));
    }
}
