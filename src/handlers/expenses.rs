use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::Extension;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::db::queries::{categories, expenses, users};
use crate::error::{AppError, AppResult};
use crate::models::{AmountMode, Expense, NewExpense};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ExpenseListParams {
    pub category_id: Option<i64>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ExpenseFormData {
    pub amount_cents: i64,
    pub date: String,
    pub category_id: i64,
    pub note: Option<String>,
    #[serde(default)]
    pub is_installment: bool,
    pub installment_count: Option<i64>,
    /// Defaults to `total` here at the boundary; core logic never sees an
    /// absent mode.
    #[serde(default)]
    pub amount_mode: AmountMode,
    #[serde(default)]
    pub is_next_month_payment: bool,
}

impl ExpenseFormData {
    /// Validate and resolve into a record, expanding per-installment amounts
    /// into the stored total. The expansion happens exactly once, at
    /// creation time.
    fn validate(&self, currency: String) -> AppResult<NewExpense> {
        if self.amount_cents <= 0 {
            return Err(AppError::Validation("Amount must be positive".into()));
        }
        if NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").is_err() {
            return Err(AppError::Validation(
                "Date must be formatted YYYY-MM-DD".into(),
            ));
        }
        if let Some(ref note) = self.note {
            if note.chars().count() > 100 {
                return Err(AppError::Validation(
                    "Note cannot exceed 100 characters".into(),
                ));
            }
        }
        if self.is_installment {
            match self.installment_count {
                Some(n) if n >= 2 => {}
                _ => {
                    return Err(AppError::Validation(
                        "Installment purchases need a count of at least 2".into(),
                    ))
                }
            }
        } else if self.amount_mode == AmountMode::PerInstallment {
            return Err(AppError::Validation(
                "Per-installment amounts require an installment purchase".into(),
            ));
        }

        let amount_cents = match (self.is_installment, self.amount_mode) {
            (true, AmountMode::PerInstallment) => {
                self.amount_cents * self.installment_count.unwrap_or(1)
            }
            _ => self.amount_cents,
        };

        Ok(NewExpense {
            category_id: self.category_id,
            amount_cents,
            currency,
            date: self.date.clone(),
            note: self.note.clone(),
            is_installment: self.is_installment,
            installment_count: self.is_installment.then_some(self.installment_count).flatten(),
            amount_mode: if self.is_installment {
                self.amount_mode
            } else {
                AmountMode::Total
            },
            is_next_month_payment: self.is_next_month_payment,
            subscription_id: None,
        })
    }
}

pub async fn index(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Query(params): Query<ExpenseListParams>,
) -> AppResult<Json<Vec<Expense>>> {
    let conn = state.db.get()?;

    let filter = expenses::ExpenseFilter {
        category_id: params.category_id,
        from_date: params.from_date,
        to_date: params.to_date,
        limit: params.limit,
        offset: params.offset,
    };
    let list = expenses::list_expenses(&conn, user_id, &filter)?;
    Ok(Json(list))
}

pub async fn show(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<Expense>> {
    let conn = state.db.get()?;
    let expense = expenses::get_expense(&conn, user_id, id)?
        .ok_or_else(|| AppError::NotFound("Expense not found".into()))?;
    Ok(Json(expense))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(form): Json<ExpenseFormData>,
) -> AppResult<impl IntoResponse> {
    let conn = state.db.get()?;

    let user = users::get_user(&conn, user_id)?
        .ok_or_else(|| AppError::Unauthorized("Unknown user".into()))?;
    let new_expense = form.validate(user.currency)?;

    categories::get_category(&conn, user_id, new_expense.category_id)?
        .ok_or_else(|| AppError::Validation("Invalid category".into()))?;

    let id = expenses::create_expense(&conn, user_id, &new_expense)?;
    let expense = expenses::get_expense(&conn, user_id, id)?
        .ok_or_else(|| AppError::Internal("Expense vanished after insert".into()))?;

    Ok((StatusCode::CREATED, Json(expense)))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(form): Json<ExpenseFormData>,
) -> AppResult<Json<Expense>> {
    let conn = state.db.get()?;

    expenses::get_expense(&conn, user_id, id)?
        .ok_or_else(|| AppError::NotFound("Expense not found".into()))?;

    let user = users::get_user(&conn, user_id)?
        .ok_or_else(|| AppError::Unauthorized("Unknown user".into()))?;
    let new_expense = form.validate(user.currency)?;

    categories::get_category(&conn, user_id, new_expense.category_id)?
        .ok_or_else(|| AppError::Validation("Invalid category".into()))?;

    expenses::update_expense(&conn, user_id, id, &new_expense)?;
    let expense = expenses::get_expense(&conn, user_id, id)?
        .ok_or_else(|| AppError::NotFound("Expense not found".into()))?;

    Ok(Json(expense))
}

pub async fn destroy(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<serde_json::Value>> {
    let conn = state.db.get()?;

    // Deleting a generated expense never touches its originating subscription
    if !expenses::delete_expense(&conn, user_id, id)? {
        return Err(AppError::NotFound("Expense not found".into()));
    }
    Ok(Json(serde_json::json!({ "message": "Expense deleted" })))
}
