//! Tests for registration, login, and session handling.

mod common;

use axum::http::StatusCode;
use common::TestClient;

#[tokio::test]
async fn test_api_requires_authentication() {
    let client = TestClient::new();

    let (status, _) = client.get("/api/categories").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = client.get("/api/expenses").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = client
        .post_json("/api/subscriptions/check-bills", serde_json::json!({}))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_is_public() {
    let client = TestClient::new();
    let (status, body) = client.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}

#[tokio::test]
async fn test_register_and_login_flow() {
    let client = TestClient::new();
    client.register_and_login("alice").await;

    let (status, body) = client.get_json("/api/categories").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!([]));
}

#[tokio::test]
async fn test_register_rejects_short_username() {
    let client = TestClient::new();
    let (status, _) = client
        .post_json(
            "/api/auth/register",
            serde_json::json!({ "username": "ab", "password": "long-enough-pw" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_rejects_short_password() {
    let client = TestClient::new();
    let (status, _) = client
        .post_json(
            "/api/auth/register",
            serde_json::json!({ "username": "alice", "password": "short" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_rejects_duplicate_username() {
    let client = TestClient::new();
    client.register_and_login("alice").await;
    client.clear_session();

    let (status, body) = client
        .post_json(
            "/api/auth/register",
            serde_json::json!({ "username": "alice", "password": "long-enough-pw" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("taken"));
}

#[tokio::test]
async fn test_login_rejects_wrong_password() {
    let client = TestClient::new();
    client.register_and_login("alice").await;
    client.clear_session();

    let (status, _) = client
        .post_json(
            "/api/auth/login",
            serde_json::json!({ "username": "alice", "password": "not-the-password" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_rejects_unknown_user() {
    let client = TestClient::new();
    let (status, _) = client
        .post_json(
            "/api/auth/login",
            serde_json::json!({ "username": "nobody", "password": "whatever-pw" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_invalidates_session() {
    let client = TestClient::new();
    client.register_and_login("alice").await;

    let (status, _) = client.get("/api/categories").await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = client
        .post_json("/api/auth/logout", serde_json::json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = client.get("/api/categories").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
