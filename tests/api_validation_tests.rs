// SPDX-License-Identifier: MIT

//! Input validation tests for the public auth and roster routes.
//!
//! These run entirely offline: every path tested here fails (or
//! succeeds) before any database access.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use tower::ServiceExt;

mod common;

async fn post_json(app: axum::Router, uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

// ─── Verification Codes ──────────────────────────────────────

#[tokio::test]
async fn test_send_code_rejects_invalid_email() {
    let (app, _) = common::create_test_app();
    let (status, json) = post_json(
        app,
        "/auth/send-code",
        serde_json::json!({"email": "not-an-email"}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "bad_request");
}

#[tokio::test]
async fn test_send_code_falls_back_to_in_band_without_mailer() {
    let (app, _) = common::create_test_app();
    let (status, json) = post_json(
        app,
        "/auth/send-code",
        serde_json::json!({"email": "student@school.test"}),
    )
    .await;

    // No SendGrid key in tests, so the code comes back in the response
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    let code = json["code"].as_str().expect("in-band code expected");
    assert_eq!(code.len(), 6);
    assert!(code.chars().all(|c| c.is_ascii_digit()));
}

#[tokio::test]
async fn test_verify_code_rejects_wrong_code() {
    let (app, state) = common::create_test_app();
    state.verification.issue_code("student@school.test");

    let (status, json) = post_json(
        app,
        "/auth/verify-code",
        serde_json::json!({"email": "student@school.test", "code": "000000"}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "bad_request");
}

#[tokio::test]
async fn test_verify_code_rejects_unknown_email() {
    let (app, _) = common::create_test_app();

    // No code was ever issued for this address
    let (status, _) = post_json(
        app,
        "/auth/verify-code",
        serde_json::json!({"email": "nobody@school.test", "code": "123456"}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ─── Registration ────────────────────────────────────────────

#[tokio::test]
async fn test_register_requires_verified_email() {
    let (app, _) = common::create_test_app();
    let (status, json) = post_json(
        app,
        "/auth/register",
        serde_json::json!({
            "email": "ana@school.test",
            "password": "longenough",
            "first_name": "Ana",
            "surname": "Cruz",
            "roster_id": "100001"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["details"]
        .as_str()
        .unwrap_or_default()
        .contains("not verified"));
}

#[tokio::test]
async fn test_register_rejects_short_password() {
    let (app, _) = common::create_test_app();
    let (status, _) = post_json(
        app,
        "/auth/register",
        serde_json::json!({
            "email": "ana@school.test",
            "password": "short",
            "first_name": "Ana",
            "surname": "Cruz",
            "roster_id": "100001"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ─── Roster ──────────────────────────────────────────────────

#[tokio::test]
async fn test_roster_lookup_known_id() {
    let (app, _) = common::create_test_app();
    let (status, json) = post_json(
        app,
        "/roster/lookup",
        serde_json::json!({"roster_id": "100001"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["student"]["first_name"], "Ana");
    assert_eq!(json["student"]["surname"], "Cruz");
    assert_eq!(json["student"]["grade"], "10");
}

#[tokio::test]
async fn test_roster_lookup_unknown_id() {
    let (app, _) = common::create_test_app();
    let (status, json) = post_json(
        app,
        "/roster/lookup",
        serde_json::json!({"roster_id": "999999"}),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "not_found");
}

#[tokio::test]
async fn test_roster_lookup_used_id() {
    let (app, _) = common::create_test_app();
    let (status, json) = post_json(
        app,
        "/roster/lookup",
        serde_json::json!({"roster_id": "100002"}),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"], "conflict");
}

#[tokio::test]
async fn test_roster_check_name_mismatch() {
    let (app, _) = common::create_test_app();
    let (status, json) = post_json(
        app,
        "/roster/check",
        serde_json::json!({
            "roster_id": "100001",
            "first_name": "Ana",
            "surname": "Santos"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["details"]
        .as_str()
        .unwrap_or_default()
        .contains("Ana Cruz"));
}

#[tokio::test]
async fn test_roster_check_name_case_insensitive() {
    let (app, _) = common::create_test_app();
    let (status, json) = post_json(
        app,
        "/roster/check",
        serde_json::json!({
            "roster_id": "100001",
            "first_name": "  ana ",
            "surname": "CRUZ"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
}

#[tokio::test]
async fn test_username_check_rejects_empty() {
    let (app, _) = common::create_test_app();
    let (status, _) = post_json(
        app,
        "/username/check",
        serde_json::json!({"username": "   "}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}
