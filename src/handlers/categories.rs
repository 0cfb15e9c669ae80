use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::Extension;
use serde::Deserialize;
use std::sync::OnceLock;

use crate::auth::CurrentUser;
use crate::db::queries::categories;
use crate::error::{AppError, AppResult};
use crate::models::{Category, NewCategory};
use crate::services::category_tree;
use crate::state::AppState;

fn color_regex() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| regex::Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("valid regex"))
}

#[derive(Debug, Deserialize)]
pub struct CategoryFormData {
    pub name: String,
    pub parent_id: Option<i64>,
    pub color: Option<String>,
}

impl CategoryFormData {
    fn validate(&self) -> AppResult<NewCategory> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("Category name cannot be empty".into()));
        }
        if name.len() > 50 {
            return Err(AppError::Validation(
                "Category name cannot exceed 50 characters".into(),
            ));
        }
        let color = self.color.clone().unwrap_or_else(|| "#6b7280".into());
        if !color_regex().is_match(&color) {
            return Err(AppError::Validation(
                "Color must be a hex code like #1a2b3c".into(),
            ));
        }
        Ok(NewCategory {
            name: name.to_string(),
            parent_id: self.parent_id,
            color,
        })
    }
}

pub async fn index(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> AppResult<Json<Vec<Category>>> {
    let conn = state.db.get()?;
    let cats = categories::list_categories(&conn, user_id)?;
    Ok(Json(cats))
}

pub async fn show(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<serde_json::Value>> {
    let conn = state.db.get()?;

    let category = categories::get_category(&conn, user_id, id)?
        .ok_or_else(|| AppError::NotFound("Category not found".into()))?;

    let children: Vec<Category> = categories::list_categories(&conn, user_id)?
        .into_iter()
        .filter(|c| c.parent_id == Some(id))
        .collect();
    let counts = categories::reference_counts(&conn, id)?;

    Ok(Json(serde_json::json!({
        "category": category,
        "children": children,
        "expense_count": counts.expenses,
        "subscription_count": counts.subscriptions,
    })))
}

/// Validate that a proposed parent exists and belongs to the caller.
fn check_parent(
    conn: &rusqlite::Connection,
    user_id: i64,
    parent_id: Option<i64>,
) -> AppResult<()> {
    if let Some(pid) = parent_id {
        categories::get_category(conn, user_id, pid)?
            .ok_or_else(|| AppError::Validation("Parent category does not exist".into()))?;
    }
    Ok(())
}

pub async fn create(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(form): Json<CategoryFormData>,
) -> AppResult<impl IntoResponse> {
    let new_category = form.validate()?;
    let conn = state.db.get()?;

    check_parent(&conn, user_id, new_category.parent_id)?;

    if categories::sibling_name_exists(
        &conn,
        user_id,
        new_category.parent_id,
        &new_category.name,
        None,
    )? {
        return Err(AppError::Validation(
            "A category with this name already exists at this level".into(),
        ));
    }

    let id = categories::create_category(&conn, user_id, &new_category)?;
    let category = categories::get_category(&conn, user_id, id)?
        .ok_or_else(|| AppError::Internal("Category vanished after insert".into()))?;

    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(form): Json<CategoryFormData>,
) -> AppResult<Json<Category>> {
    let new_category = form.validate()?;
    let conn = state.db.get()?;

    categories::get_category(&conn, user_id, id)?
        .ok_or_else(|| AppError::NotFound("Category not found".into()))?;

    check_parent(&conn, user_id, new_category.parent_id)?;

    // Reparenting is gated by the cycle check over a fresh snapshot of the
    // user's forest; the forest stays acyclic because no parent mutation
    // bypasses this path.
    let edges = categories::parent_edges(&conn, user_id)?;
    if category_tree::would_create_cycle(id, new_category.parent_id, &edges) {
        return Err(AppError::Validation(
            "Cannot set parent: would create a circular reference".into(),
        ));
    }

    if categories::sibling_name_exists(
        &conn,
        user_id,
        new_category.parent_id,
        &new_category.name,
        Some(id),
    )? {
        return Err(AppError::Validation(
            "A category with this name already exists at this level".into(),
        ));
    }

    categories::update_category(&conn, user_id, id, &new_category)?;
    let category = categories::get_category(&conn, user_id, id)?
        .ok_or_else(|| AppError::NotFound("Category not found".into()))?;

    Ok(Json(category))
}

pub async fn destroy(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<serde_json::Value>> {
    let conn = state.db.get()?;

    categories::get_category(&conn, user_id, id)?
        .ok_or_else(|| AppError::NotFound("Category not found".into()))?;

    // Referential guard: never cascade
    let counts = categories::reference_counts(&conn, id)?;
    if counts.is_referenced() {
        let mut reasons = Vec::new();
        if counts.expenses > 0 {
            reasons.push(format!("{} expense(s)", counts.expenses));
        }
        if counts.subscriptions > 0 {
            reasons.push(format!("{} subscription(s)", counts.subscriptions));
        }
        if counts.children > 0 {
            reasons.push(format!("{} child categor(ies)", counts.children));
        }
        return Err(AppError::Validation(format!(
            "Cannot delete category: still referenced by {}",
            reasons.join(", ")
        )));
    }

    categories::delete_category(&conn, user_id, id)?;
    Ok(Json(serde_json::json!({ "message": "Category deleted" })))
}
