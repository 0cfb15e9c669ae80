//! Shared test utilities for integration tests.
//!
//! Provides a `TestClient` that simulates a browser session against the full
//! application router (auth middleware included) backed by an in-memory
//! database. The client remembers the session cookie from `login`, so a test
//! reads like a sequence of API calls by one user.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use spendwise::config::Config;
use spendwise::db::{create_in_memory_pool, migrations};
use spendwise::server;
use spendwise::state::AppState;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

/// A test client that simulates a browser session, allowing sequential
/// requests against the application.
pub struct TestClient {
    state: AppState,
    session_cookie: Mutex<Option<String>>,
}

impl TestClient {
    /// Create a new test client with a fresh in-memory database.
    pub fn new() -> Self {
        let pool = create_in_memory_pool().expect("Failed to create in-memory pool");
        {
            let conn = pool.get().expect("Failed to get connection");
            migrations::run_migrations(&conn, Path::new("migrations"))
                .expect("Failed to run migrations");
        }

        let config = Config {
            host: "127.0.0.1".into(),
            port: 7080,
            database_path: PathBuf::from(":memory:"),
            migrations_path: PathBuf::from("migrations"),
        };

        let state = AppState {
            db: pool,
            config: Arc::new(config),
            sessions: Arc::new(Mutex::new(HashMap::new())),
        };

        Self {
            state,
            session_cookie: Mutex::new(None),
        }
    }

    /// The full production router: handlers, auth middleware, cookies.
    pub fn router(&self) -> Router {
        server::build_router(self.state.clone())
    }

    async fn request(
        &self,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, String) {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(cookie) = self.session_cookie.lock().unwrap().as_ref() {
            builder = builder.header(header::COOKIE, cookie.clone());
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();

        // Remember the session cookie from login responses
        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            if let Ok(value) = set_cookie.to_str() {
                if let Some(pair) = value.split(';').next() {
                    if pair.starts_with("session=") {
                        *self.session_cookie.lock().unwrap() = Some(pair.to_string());
                    }
                }
            }
        }

        let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8_lossy(&body_bytes).to_string())
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, String) {
        self.request("GET", uri, None).await
    }

    pub async fn post_json(&self, uri: &str, json: serde_json::Value) -> (StatusCode, String) {
        self.request("POST", uri, Some(json)).await
    }

    pub async fn put_json(&self, uri: &str, json: serde_json::Value) -> (StatusCode, String) {
        self.request("PUT", uri, Some(json)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, String) {
        self.request("DELETE", uri, None).await
    }

    /// GET a JSON endpoint and parse the body.
    pub async fn get_json(&self, uri: &str) -> (StatusCode, serde_json::Value) {
        let (status, body) = self.get(uri).await;
        let parsed = serde_json::from_str(&body).unwrap_or(serde_json::Value::Null);
        (status, parsed)
    }

    /// Drop the stored session cookie, turning this client anonymous again.
    pub fn clear_session(&self) {
        *self.session_cookie.lock().unwrap() = None;
    }

    // =========================================================================
    // Helper methods for creating entities through the API
    // =========================================================================

    /// Register a user and log them in; subsequent requests carry the session.
    pub async fn register_and_login(&self, username: &str) -> i64 {
        let (status, body) = self
            .post_json(
                "/api/auth/register",
                serde_json::json!({ "username": username, "password": "correct-horse-42" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
        let registered: serde_json::Value = serde_json::from_str(&body).unwrap();

        let (status, body) = self
            .post_json(
                "/api/auth/login",
                serde_json::json!({ "username": username, "password": "correct-horse-42" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);

        registered["id"].as_i64().unwrap()
    }

    /// Create a category and return its id.
    pub async fn create_category(&self, name: &str, parent_id: Option<i64>) -> i64 {
        let (status, body) = self
            .post_json(
                "/api/categories",
                serde_json::json!({ "name": name, "parent_id": parent_id }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create category failed: {}", body);
        let category: serde_json::Value = serde_json::from_str(&body).unwrap();
        category["id"].as_i64().unwrap()
    }

    /// Create a plain expense and return its id.
    pub async fn create_expense(&self, category_id: i64, amount_cents: i64, date: &str) -> i64 {
        let (status, body) = self
            .post_json(
                "/api/expenses",
                serde_json::json!({
                    "amount_cents": amount_cents,
                    "date": date,
                    "category_id": category_id,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create expense failed: {}", body);
        let expense: serde_json::Value = serde_json::from_str(&body).unwrap();
        expense["id"].as_i64().unwrap()
    }

    /// Create a subscription and return its id.
    pub async fn create_subscription(&self, json: serde_json::Value) -> i64 {
        let (status, body) = self.post_json("/api/subscriptions", json).await;
        assert_eq!(
            status,
            StatusCode::CREATED,
            "create subscription failed: {}",
            body
        );
        let sub: serde_json::Value = serde_json::from_str(&body).unwrap();
        sub["id"].as_i64().unwrap()
    }
}

impl Default for TestClient {
    fn default() -> Self {
        Self::new()
    }
}
