// SPDX-License-Identifier: MIT

//! Firestore integration tests.
//!
//! These require the Firestore emulator (FIRESTORE_EMULATOR_HOST) and are
//! skipped otherwise. Each test uses distinct document IDs so runs do not
//! interfere.

use studymatch::db::firestore::MessageQueryCursor;
use studymatch::models::{ChatMessage, ChatSession, PasswordHash, Session, User};
use studymatch::time_utils::format_utc_rfc3339;

mod common;

fn test_user(email: &str) -> User {
    User {
        email: email.to_string(),
        name: "Test".to_string(),
        surname: "User".to_string(),
        username: Some(email.split('@').next().unwrap_or("user").to_string()),
        roster_id: Some("000000".to_string()),
        grade: Some("10".to_string()),
        section: Some("A".to_string()),
        password: PasswordHash {
            salt: "00".repeat(16),
            hash: "00".repeat(32),
        },
        strengths: vec!["Math".to_string()],
        weaknesses: vec!["History".to_string()],
        profile_complete: true,
        is_admin: false,
        created_at: format_utc_rfc3339(chrono::Utc::now()),
        notifications: vec![],
        quizzes: vec![],
    }
}

#[tokio::test]
async fn test_user_round_trip() {
    require_emulator!();
    let db = common::test_db().await;

    let user = test_user("itest-roundtrip@school.test");
    db.upsert_user(&user).await.unwrap();

    let fetched = db
        .get_user("itest-roundtrip@school.test")
        .await
        .unwrap()
        .expect("user should exist");
    assert_eq!(fetched.name, "Test");
    assert_eq!(fetched.strengths, vec!["Math".to_string()]);

    assert!(db.get_user("itest-missing@school.test").await.unwrap().is_none());
}

#[tokio::test]
async fn test_username_lookup() {
    require_emulator!();
    let db = common::test_db().await;

    let mut user = test_user("itest-username@school.test");
    user.username = Some("itest-uniquename".to_string());
    db.upsert_user(&user).await.unwrap();

    let found = db
        .find_user_by_username("itest-uniquename")
        .await
        .unwrap()
        .expect("username should resolve");
    assert_eq!(found.email, "itest-username@school.test");

    assert!(db
        .find_user_by_username("itest-no-such-name")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_expired_session_is_deleted_lazily() {
    require_emulator!();
    let db = common::test_db().await;

    let now = chrono::Utc::now();
    let session = Session {
        session_id: "itest-expired-session".to_string(),
        email: "itest-session@school.test".to_string(),
        created_at: format_utc_rfc3339(now - chrono::Duration::days(31)),
        expires_at: format_utc_rfc3339(now - chrono::Duration::days(1)),
    };
    db.put_session(&session).await.unwrap();

    // Lookup sees the expiry and removes the document
    assert!(db.get_session("itest-expired-session").await.unwrap().is_none());
    assert!(db.get_session("itest-expired-session").await.unwrap().is_none());
}

#[tokio::test]
async fn test_live_session_round_trip() {
    require_emulator!();
    let db = common::test_db().await;

    let now = chrono::Utc::now();
    let session = Session {
        session_id: "itest-live-session".to_string(),
        email: "itest-session@school.test".to_string(),
        created_at: format_utc_rfc3339(now),
        expires_at: format_utc_rfc3339(now + chrono::Duration::days(30)),
    };
    db.put_session(&session).await.unwrap();

    let fetched = db
        .get_session("itest-live-session")
        .await
        .unwrap()
        .expect("session should be live");
    assert_eq!(fetched.email, "itest-session@school.test");

    db.delete_session("itest-live-session").await.unwrap();
    assert!(db.get_session("itest-live-session").await.unwrap().is_none());
}

#[tokio::test]
async fn test_message_pagination() {
    require_emulator!();
    let db = common::test_db().await;

    let conversation_id =
        ChatMessage::conversation_id("itest-page-a@school.test", "itest-page-b@school.test");
    let base = chrono::Utc::now();
    for i in 0..5 {
        db.insert_message(&ChatMessage {
            id: format!("itest-page-msg-{i}"),
            conversation_id: conversation_id.clone(),
            from: "itest-page-a@school.test".to_string(),
            to: "itest-page-b@school.test".to_string(),
            body: format!("message {i}"),
            sent_at: format_utc_rfc3339(base + chrono::Duration::seconds(i)),
        })
        .await
        .unwrap();
    }

    // First page: newest two
    let page = db
        .conversation_messages(&conversation_id, None, 2)
        .await
        .unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].body, "message 4");
    assert_eq!(page[1].body, "message 3");

    // Second page resumes after the last document of the first
    let cursor = MessageQueryCursor {
        sent_at: &page[1].sent_at,
        message_id: &page[1].id,
    };
    let next = db
        .conversation_messages(&conversation_id, Some(cursor), 2)
        .await
        .unwrap();
    assert_eq!(next.len(), 2);
    assert_eq!(next[0].body, "message 2");
    assert_eq!(next[1].body, "message 1");
}

#[tokio::test]
async fn test_active_chat_lookup() {
    require_emulator!();
    let db = common::test_db().await;

    let session = ChatSession {
        id: "itest-chat-1".to_string(),
        requester: "itest-chat-req@school.test".to_string(),
        helper: "itest-chat-help@school.test".to_string(),
        subject: "Physics".to_string(),
        active: true,
        created_at: format_utc_rfc3339(chrono::Utc::now()),
        closed_at: None,
        closed_by: None,
    };
    db.upsert_chat_session(&session).await.unwrap();

    let found = db
        .find_active_chat_between("itest-chat-req@school.test", "itest-chat-help@school.test")
        .await
        .unwrap()
        .expect("active chat should be found");
    assert_eq!(found.subject, "Physics");

    // Closing takes it out of the active set
    let mut closed = found;
    closed.active = false;
    closed.closed_at = Some(format_utc_rfc3339(chrono::Utc::now()));
    closed.closed_by = Some("itest-chat-req@school.test".to_string());
    db.upsert_chat_session(&closed).await.unwrap();

    assert!(db
        .find_active_chat_between("itest-chat-req@school.test", "itest-chat-help@school.test")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_notification_push_and_remove() {
    require_emulator!();
    let db = common::test_db().await;

    let user = test_user("itest-notify@school.test");
    db.upsert_user(&user).await.unwrap();

    let notification = studymatch::models::Notification {
        id: "itest-notification-1".to_string(),
        kind: "help_request".to_string(),
        from: studymatch::models::NotificationSender {
            username: "helper".to_string(),
            email: "itest-sender@school.test".to_string(),
            grade: Some("10".to_string()),
        },
        subject: "Math".to_string(),
        message: "helper needs help with Math!".to_string(),
        redirect: None,
        created_at: format_utc_rfc3339(chrono::Utc::now()),
    };
    db.push_notification("itest-notify@school.test", notification)
        .await
        .unwrap();

    let fetched = db
        .get_user("itest-notify@school.test")
        .await
        .unwrap()
        .unwrap();
    assert!(fetched
        .notifications
        .iter()
        .any(|n| n.id == "itest-notification-1"));

    db.remove_notification("itest-notify@school.test", "itest-notification-1")
        .await
        .unwrap();
    let fetched = db
        .get_user("itest-notify@school.test")
        .await
        .unwrap()
        .unwrap();
    assert!(!fetched
        .notifications
        .iter()
        .any(|n| n.id == "itest-notification-1"));
}
