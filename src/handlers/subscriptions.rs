use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::Extension;
use chrono::{Local, NaiveDate};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::db::queries::{categories, expenses, subscriptions, users};
use crate::error::{AppError, AppResult};
use crate::models::{NewSubscription, Subscription};
use crate::services::billing;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SubscriptionFormData {
    pub name: String,
    pub description: Option<String>,
    pub category_id: i64,
    pub amount_cents: i64,
    pub billing_day: u32,
    pub start_date: String,
    pub end_date: Option<String>,
    pub is_active: Option<bool>,
}

impl SubscriptionFormData {
    fn validate(&self) -> AppResult<NewSubscription> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation(
                "Subscription name cannot be empty".into(),
            ));
        }
        if name.chars().count() > 50 {
            return Err(AppError::Validation(
                "Subscription name cannot exceed 50 characters".into(),
            ));
        }
        if let Some(ref description) = self.description {
            if description.chars().count() > 200 {
                return Err(AppError::Validation(
                    "Description cannot exceed 200 characters".into(),
                ));
            }
        }
        if self.amount_cents <= 0 {
            return Err(AppError::Validation("Amount must be positive".into()));
        }
        if !(1..=31).contains(&self.billing_day) {
            return Err(AppError::Validation(
                "Billing day must be between 1 and 31".into(),
            ));
        }
        let start = NaiveDate::parse_from_str(&self.start_date, "%Y-%m-%d")
            .map_err(|_| AppError::Validation("Start date must be formatted YYYY-MM-DD".into()))?;
        if let Some(ref end_str) = self.end_date {
            let end = NaiveDate::parse_from_str(end_str, "%Y-%m-%d").map_err(|_| {
                AppError::Validation("End date must be formatted YYYY-MM-DD".into())
            })?;
            if end <= start {
                return Err(AppError::Validation(
                    "End date must be after the start date".into(),
                ));
            }
        }

        Ok(NewSubscription {
            name: name.to_string(),
            description: self.description.clone(),
            category_id: self.category_id,
            amount_cents: self.amount_cents,
            billing_day: self.billing_day,
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
            is_active: self.is_active.unwrap_or(true),
        })
    }
}

pub async fn index(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> AppResult<Json<Vec<Subscription>>> {
    let conn = state.db.get()?;
    let subs = subscriptions::list_subscriptions(&conn, user_id)?;
    Ok(Json(subs))
}

pub async fn show(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<Subscription>> {
    let conn = state.db.get()?;
    let sub = subscriptions::get_subscription(&conn, user_id, id)?
        .ok_or_else(|| AppError::NotFound("Subscription not found".into()))?;
    Ok(Json(sub))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(form): Json<SubscriptionFormData>,
) -> AppResult<impl IntoResponse> {
    let new_subscription = form.validate()?;
    let conn = state.db.get()?;

    categories::get_category(&conn, user_id, new_subscription.category_id)?
        .ok_or_else(|| AppError::Validation("Invalid category".into()))?;

    let user = users::get_user(&conn, user_id)?
        .ok_or_else(|| AppError::Unauthorized("Unknown user".into()))?;

    let id = subscriptions::create_subscription(&conn, user_id, &user.currency, &new_subscription)?;
    let sub = subscriptions::get_subscription(&conn, user_id, id)?
        .ok_or_else(|| AppError::Internal("Subscription vanished after insert".into()))?;

    Ok((StatusCode::CREATED, Json(sub)))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(form): Json<SubscriptionFormData>,
) -> AppResult<Json<Subscription>> {
    let new_subscription = form.validate()?;
    let conn = state.db.get()?;

    subscriptions::get_subscription(&conn, user_id, id)?
        .ok_or_else(|| AppError::NotFound("Subscription not found".into()))?;

    categories::get_category(&conn, user_id, new_subscription.category_id)?
        .ok_or_else(|| AppError::Validation("Invalid category".into()))?;

    subscriptions::update_subscription(&conn, user_id, id, &new_subscription)?;
    let sub = subscriptions::get_subscription(&conn, user_id, id)?
        .ok_or_else(|| AppError::NotFound("Subscription not found".into()))?;

    Ok(Json(sub))
}

pub async fn destroy(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<serde_json::Value>> {
    let conn = state.db.get()?;

    // History survives: generated expenses keep their back-reference
    if !subscriptions::delete_subscription(&conn, user_id, id)? {
        return Err(AppError::NotFound("Subscription not found".into()));
    }
    Ok(Json(serde_json::json!({ "message": "Subscription deleted" })))
}

/// Pull-based bill generation: read fresh snapshots, compute due periods,
/// materialize each as an expense. Safe to call any number of times; the
/// idempotence set plus the storage-layer unique index prevent duplicates.
pub async fn check_bills(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> AppResult<Json<serde_json::Value>> {
    let conn = state.db.get()?;

    let subs = subscriptions::list_subscriptions(&conn, user_id)?;
    let existing = billing::existing_periods(&expenses::list_generated_bills(&conn, user_id)?);
    let as_of = Local::now().date_naive();

    let run = billing::compute_due_bills(&subs, &existing, as_of);

    let names: HashMap<i64, String> = subs.iter().map(|s| (s.id, s.name.clone())).collect();

    let mut generated = 0;
    for bill in &run.bills {
        let note = names.get(&bill.subscription_id).cloned();
        let record = bill.to_new_expense(note);
        if expenses::insert_generated_bill(&conn, user_id, &record)? {
            generated += 1;
        }
    }

    if generated > 0 {
        tracing::info!(user_id, generated, "Generated subscription bills");
    }

    Ok(Json(serde_json::json!({
        "generated": generated,
        "warnings": run.warnings,
    })))
}
