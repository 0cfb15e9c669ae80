use axum::extract::State;
use axum::response::Json;
use axum::Extension;
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::db::queries::users;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SettingsUpdateData {
    pub currency: String,
}

pub async fn show(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> AppResult<Json<serde_json::Value>> {
    let conn = state.db.get()?;

    let user = users::get_user(&conn, user_id)?
        .ok_or_else(|| AppError::Unauthorized("Unknown user".into()))?;

    Ok(Json(serde_json::json!({
        "username": user.username,
        "currency": user.currency,
        "monthly_budget_cents": user.monthly_budget_cents,
    })))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(data): Json<SettingsUpdateData>,
) -> AppResult<Json<serde_json::Value>> {
    let currency = data.currency.trim().to_uppercase();
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(AppError::Validation(
            "Currency must be a 3-letter ISO code".into(),
        ));
    }

    let conn = state.db.get()?;
    users::update_currency(&conn, user_id, &currency)?;

    Ok(Json(serde_json::json!({ "currency": currency })))
}
