//! Authentication middleware and handlers.
//!
//! Every record in the store is scoped to one owning user, so every API
//! handler needs to know who is calling. Users authenticate with a username
//! and an Argon2-hashed password; a successful login issues a
//! cryptographically random session token held in a server-side store and a
//! http-only cookie. The middleware resolves the cookie to a [`CurrentUser`]
//! extension that downstream handlers extract. Tokens are invalidated on
//! logout or server restart.

use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;
use tower_cookies::{Cookie, Cookies};
use uuid::Uuid;

use crate::db::queries::users;
use crate::error::{AppError, AppResult};
use crate::models::NewUser;
use crate::state::AppState;

/// Cookie name for the session token.
const SESSION_COOKIE: &str = "session";

/// The authenticated user id, inserted by [`auth_middleware`] and extracted
/// by handlers via `Extension<CurrentUser>`.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub i64);

/// Routes that must work without a session.
fn is_public(path: &str) -> bool {
    path.starts_with("/api/auth/") || path == "/health"
}

/// Authentication middleware resolving the session cookie to a user id.
pub async fn auth_middleware(
    State(state): State<AppState>,
    cookies: Cookies,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    if is_public(request.uri().path()) {
        return next.run(request).await;
    }

    if let Some(session_cookie) = cookies.get(SESSION_COOKIE) {
        let token = session_cookie.value().to_string();
        let user_id = state
            .sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&token)
            .copied();
        if let Some(user_id) = user_id {
            request.extensions_mut().insert(CurrentUser(user_id));
            return next.run(request).await;
        }
    }

    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({ "error": "Authentication required" })),
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
pub struct RegisterData {
    pub username: String,
    pub password: String,
    pub currency: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginData {
    pub username: String,
    pub password: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(data): Json<RegisterData>,
) -> AppResult<impl IntoResponse> {
    let username = data.username.trim();
    if username.len() < 3 || !username.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(AppError::Validation(
            "Username must be at least 3 characters, alphanumeric or underscore".into(),
        ));
    }
    if data.password.len() < 8 {
        return Err(AppError::Validation(
            "Password must be at least 8 characters".into(),
        ));
    }

    let conn = state.db.get()?;

    if users::get_user_by_username(&conn, username)?.is_some() {
        return Err(AppError::Validation("Username is already taken".into()));
    }

    let new_user = NewUser {
        username: username.to_string(),
        password_hash: hash_password(&data.password)?,
        currency: data.currency.unwrap_or_else(|| "USD".into()),
    };
    let id = users::create_user(&conn, &new_user)?;
    tracing::info!(user_id = id, "Registered user");

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "id": id, "username": username })),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(data): Json<LoginData>,
) -> AppResult<impl IntoResponse> {
    let conn = state.db.get()?;

    let user = users::get_user_by_username(&conn, data.username.trim())?
        .ok_or_else(|| AppError::Unauthorized("Invalid username or password".into()))?;

    if !verify_password(&data.password, &user.password_hash) {
        return Err(AppError::Unauthorized(
            "Invalid username or password".into(),
        ));
    }

    let session_token = Uuid::new_v4().to_string();
    state
        .sessions
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .insert(session_token.clone(), user.id);

    let cookie = Cookie::build((SESSION_COOKIE, session_token))
        .path("/")
        .http_only(true)
        .same_site(tower_cookies::cookie::SameSite::Strict)
        .build();
    cookies.add(cookie);

    tracing::info!(user_id = user.id, "User logged in");

    Ok(Json(serde_json::json!({
        "id": user.id,
        "username": user.username,
        "currency": user.currency,
    })))
}

pub async fn logout(State(state): State<AppState>, cookies: Cookies) -> impl IntoResponse {
    if let Some(session_cookie) = cookies.get(SESSION_COOKIE) {
        state
            .sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(session_cookie.value());
    }

    let cookie = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .build();
    cookies.remove(cookie);

    Json(serde_json::json!({ "message": "Logged out" }))
}

fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

/// Verify a password against an Argon2 hash.
fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(hash) else {
        tracing::error!("Invalid password hash stored for user");
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}
