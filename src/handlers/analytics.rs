use std::collections::HashMap;

use axum::extract::{Query, State};
use axum::response::Json;
use axum::Extension;
use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::date_utils::days_in_month;
use crate::db::queries::{categories, expenses};
use crate::error::{AppError, AppResult};
use crate::services::category_tree::{self, EdgeMap};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct SpendingParams {
    pub year: Option<i32>,
    pub month: Option<u32>,
    /// When set, break spending down by the direct children of this
    /// category instead of by top-level ancestor.
    pub parent_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct CategorySpending {
    pub category_id: i64,
    pub category: String,
    pub color: String,
    pub amount_cents: i64,
    pub percentage: f64,
}

#[derive(Debug, Default, Deserialize)]
pub struct SummaryParams {
    pub from_date: Option<String>,
    pub to_date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MonthlySummary {
    pub month: String,
    pub total_cents: i64,
    pub expense_count: i64,
    pub average_cents: i64,
}

/// Resolve the grouping bucket for an expense's category.
///
/// Without a selected parent, every category rolls up to its top-level
/// ancestor. With a selected parent, spending inside that subtree is grouped
/// by the parent's direct children (spending assigned to the parent itself
/// stays on the parent); anything outside the subtree is excluded.
fn rollup_bucket(category_id: i64, parent_id: Option<i64>, edges: &EdgeMap) -> Option<i64> {
    match parent_id {
        None => Some(category_tree::find_top_level_ancestor(category_id, edges)),
        Some(pid) => {
            if category_id == pid {
                return Some(pid);
            }
            if !category_tree::is_descendant_of(category_id, pid, edges) {
                return None;
            }
            // Climb until the node directly under the selected parent
            let mut current = category_id;
            for _ in 0..=edges.len() {
                match edges.get(&current) {
                    Some(Some(parent)) if *parent == pid => return Some(current),
                    Some(Some(parent)) => current = *parent,
                    _ => return None,
                }
            }
            None
        }
    }
}

pub async fn spending_by_category(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Query(params): Query<SpendingParams>,
) -> AppResult<Json<Vec<CategorySpending>>> {
    let conn = state.db.get()?;

    let today = Local::now().date_naive();
    let year = params.year.unwrap_or_else(|| today.year());
    let month = params.month.unwrap_or_else(|| today.month());
    if !(1..=12).contains(&month) {
        return Err(AppError::Validation("Month must be 1-12".into()));
    }
    let from = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| AppError::Validation("Invalid year/month".into()))?;
    let to = NaiveDate::from_ymd_opt(year, month, days_in_month(year, month))
        .ok_or_else(|| AppError::Validation("Invalid year/month".into()))?;

    if let Some(pid) = params.parent_id {
        categories::get_category(&conn, user_id, pid)?
            .ok_or_else(|| AppError::NotFound("Category not found".into()))?;
    }

    let cats = categories::list_categories(&conn, user_id)?;
    let edges = categories::parent_edges(&conn, user_id)?;
    let meta: HashMap<i64, (&str, &str)> = cats
        .iter()
        .map(|c| (c.id, (c.name.as_str(), c.color.as_str())))
        .collect();

    let filter = expenses::ExpenseFilter {
        from_date: Some(from.format("%Y-%m-%d").to_string()),
        to_date: Some(to.format("%Y-%m-%d").to_string()),
        ..Default::default()
    };
    let expense_list = expenses::list_expenses(&conn, user_id, &filter)?;

    let mut totals: HashMap<i64, i64> = HashMap::new();
    for expense in &expense_list {
        if let Some(bucket) = rollup_bucket(expense.category_id, params.parent_id, &edges) {
            *totals.entry(bucket).or_insert(0) += expense.amount_cents;
        }
    }

    let total: i64 = totals.values().sum();

    let mut result: Vec<CategorySpending> = totals
        .into_iter()
        .map(|(category_id, amount_cents)| {
            let (name, color) = meta
                .get(&category_id)
                .copied()
                .unwrap_or(("Unknown", "#6b7280"));
            CategorySpending {
                category_id,
                category: name.to_string(),
                color: color.to_string(),
                amount_cents,
                percentage: if total > 0 {
                    (amount_cents as f64 / total as f64) * 100.0
                } else {
                    0.0
                },
            }
        })
        .collect();

    result.sort_by(|a, b| b.amount_cents.cmp(&a.amount_cents));

    Ok(Json(result))
}

pub async fn monthly_summary(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Query(params): Query<SummaryParams>,
) -> AppResult<Json<Vec<MonthlySummary>>> {
    let conn = state.db.get()?;

    let filter = expenses::ExpenseFilter {
        from_date: params.from_date,
        to_date: params.to_date,
        ..Default::default()
    };
    let expense_list = expenses::list_expenses(&conn, user_id, &filter)?;

    let mut monthly_data: HashMap<String, (i64, i64)> = HashMap::new();
    for expense in &expense_list {
        let month = if expense.date.len() >= 7 {
            expense.date[..7].to_string()
        } else {
            continue;
        };
        let entry = monthly_data.entry(month).or_insert((0, 0));
        entry.0 += expense.amount_cents;
        entry.1 += 1;
    }

    let mut result: Vec<MonthlySummary> = monthly_data
        .into_iter()
        .map(|(month, (total_cents, expense_count))| MonthlySummary {
            month,
            total_cents,
            expense_count,
            average_cents: if expense_count > 0 {
                total_cents / expense_count
            } else {
                0
            },
        })
        .collect();

    result.sort_by(|a, b| a.month.cmp(&b.month));

    Ok(Json(result))
}
