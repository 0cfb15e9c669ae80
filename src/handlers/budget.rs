use axum::extract::State;
use axum::response::Json;
use axum::Extension;
use chrono::Local;
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::date_utils::{month_end, month_start};
use crate::db::queries::{expenses, users};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct BudgetUpdateData {
    /// `null` clears the budget.
    pub monthly_budget_cents: Option<i64>,
}

/// Current-month budget status: the configured budget plus what has been
/// spent so far this month.
pub async fn show(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> AppResult<Json<serde_json::Value>> {
    let conn = state.db.get()?;

    let user = users::get_user(&conn, user_id)?
        .ok_or_else(|| AppError::Unauthorized("Unknown user".into()))?;

    let today = Local::now().date_naive();
    let spent = expenses::sum_expenses_between(
        &conn,
        user_id,
        &month_start(today).format("%Y-%m-%d").to_string(),
        &month_end(today).format("%Y-%m-%d").to_string(),
    )?;

    let remaining = user.monthly_budget_cents.map(|b| b - spent);

    Ok(Json(serde_json::json!({
        "monthly_budget_cents": user.monthly_budget_cents,
        "spent_cents": spent,
        "remaining_cents": remaining,
    })))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(data): Json<BudgetUpdateData>,
) -> AppResult<Json<serde_json::Value>> {
    if let Some(budget) = data.monthly_budget_cents {
        if budget < 0 {
            return Err(AppError::Validation(
                "Budget must be zero or positive".into(),
            ));
        }
    }

    let conn = state.db.get()?;
    users::update_monthly_budget(&conn, user_id, data.monthly_budget_cents)?;

    Ok(Json(serde_json::json!({
        "monthly_budget_cents": data.monthly_budget_cents,
    })))
}
