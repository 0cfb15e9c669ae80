use axum::middleware;
use axum::Router;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tower_cookies::CookieManagerLayer;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use crate::auth;
use crate::config::Config;
use crate::db::{create_pool, migrations};
use crate::handlers;
use crate::state::AppState;

/// Build the application state and Axum router from a [`Config`].
///
/// Creates the database pool, runs migrations, and assembles the full
/// middleware stack. Returns the shared state and a ready-to-serve router.
pub fn build_app(config: Config) -> Result<(AppState, Router), Box<dyn std::error::Error>> {
    let db = create_pool(&config.database_path)?;

    {
        let conn = db.get()?;
        migrations::run_migrations(&conn, &config.migrations_path)?;
    }

    let state = AppState {
        db,
        config: Arc::new(config),
        sessions: Arc::new(Mutex::new(HashMap::new())),
    };

    let app = build_router(state.clone());
    Ok((state, app))
}

/// Assemble the router and middleware stack around an existing [`AppState`].
///
/// Split out from [`build_app`] so integration tests can run against an
/// in-memory database with the production middleware applied.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(handlers::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ))
        .layer(CookieManagerLayer::new())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
