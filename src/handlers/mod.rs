pub mod analytics;
pub mod budget;
pub mod categories;
pub mod expenses;
pub mod settings;
pub mod subscriptions;

use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::auth;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        // Auth
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        // Categories
        .route("/api/categories", get(categories::index))
        .route("/api/categories", post(categories::create))
        .route("/api/categories/:id", get(categories::show))
        .route("/api/categories/:id", put(categories::update))
        .route("/api/categories/:id", delete(categories::destroy))
        // Expenses
        .route("/api/expenses", get(expenses::index))
        .route("/api/expenses", post(expenses::create))
        .route("/api/expenses/:id", get(expenses::show))
        .route("/api/expenses/:id", put(expenses::update))
        .route("/api/expenses/:id", delete(expenses::destroy))
        // Subscriptions
        .route("/api/subscriptions", get(subscriptions::index))
        .route("/api/subscriptions", post(subscriptions::create))
        .route("/api/subscriptions/:id", get(subscriptions::show))
        .route("/api/subscriptions/:id", put(subscriptions::update))
        .route("/api/subscriptions/:id", delete(subscriptions::destroy))
        // On-demand bill generation trigger (no background scheduler)
        .route("/api/subscriptions/check-bills", post(subscriptions::check_bills))
        // Budget
        .route("/api/budget", get(budget::show))
        .route("/api/budget", put(budget::update))
        // User settings
        .route("/api/user/settings", get(settings::show))
        .route("/api/user/settings", put(settings::update))
        // Analytics (JSON for charts)
        .route(
            "/api/analytics/spending-by-category",
            get(analytics::spending_by_category),
        )
        .route(
            "/api/analytics/monthly-summary",
            get(analytics::monthly_summary),
        )
        // Health check
        .route("/health", get(health))
}

async fn health() -> &'static str {
    "OK"
}
