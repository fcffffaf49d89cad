// SPDX-License-Identifier: MIT

//! Auth cookie attribute tests.
//!
//! These tests verify cookie removal attributes on logout match the
//! creation attributes for localhost and production-style frontends.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
};
use tower::ServiceExt;

mod common;

fn set_cookie_headers(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

fn find_cookie(headers: &[String], name: &str) -> String {
    headers
        .iter()
        .find(|value| value.starts_with(&format!("{name}=")))
        .cloned()
        .unwrap_or_else(|| panic!("missing Set-Cookie header for {name}: {headers:?}"))
}

#[tokio::test]
async fn test_logout_cookie_removal_localhost_attributes() {
    let (app, _) = common::create_test_app_with_frontend_url("http://localhost:5173");

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/logout")
                .header(header::COOKIE, "studymatch_session=test")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let set_cookies = set_cookie_headers(&response);
    let session_cookie = find_cookie(&set_cookies, "studymatch_session");

    assert!(session_cookie.contains("Path=/"));
    assert!(session_cookie.contains("HttpOnly"));
    assert!(session_cookie.contains("SameSite=Lax"));
    assert!(session_cookie.contains("Max-Age=0"));
    assert!(!session_cookie.contains("Secure"));
}

#[tokio::test]
async fn test_logout_cookie_removal_production_attributes() {
    let (app, _) = common::create_test_app_with_frontend_url("https://studymatch.example.org");

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/logout")
                .header(header::COOKIE, "studymatch_session=test")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let set_cookies = set_cookie_headers(&response);
    let session_cookie = find_cookie(&set_cookies, "studymatch_session");

    assert!(session_cookie.contains("Path=/"));
    assert!(session_cookie.contains("HttpOnly"));
    assert!(session_cookie.contains("SameSite=Lax"));
    assert!(session_cookie.contains("Max-Age=0"));
    assert!(session_cookie.contains("Secure"));
}

#[tokio::test]
async fn test_logout_without_cookie_still_succeeds() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/logout")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // Idempotent: logging out while logged out just clears the cookie
    assert_eq!(response.status(), StatusCode::OK);
    let set_cookies = set_cookie_headers(&response);
    let session_cookie = find_cookie(&set_cookies, "studymatch_session");
    assert!(session_cookie.contains("Max-Age=0"));
}
