//! Category queries. Every function is scoped to the owning user; callers
//! pass the authenticated user id and never see another user's rows.

use std::collections::HashMap;

use crate::models::{Category, NewCategory};
use crate::services::category_tree::EdgeMap;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

fn map_category(row: &rusqlite::Row) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        color: row.get(3)?,
        parent_id: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

const CATEGORY_COLUMNS: &str = "id, user_id, name, color, parent_id, created_at, updated_at";

pub fn list_categories(conn: &Connection, user_id: i64) -> rusqlite::Result<Vec<Category>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM categories WHERE user_id = ? ORDER BY name",
        CATEGORY_COLUMNS
    ))?;

    let categories = stmt
        .query_map([user_id], map_category)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(categories)
}

/// The parent-edge map for one user's forest, as consumed by the tree walks
/// in [`crate::services::category_tree`].
pub fn parent_edges(conn: &Connection, user_id: i64) -> rusqlite::Result<EdgeMap> {
    let mut stmt = conn.prepare("SELECT id, parent_id FROM categories WHERE user_id = ?")?;
    let edges = stmt
        .query_map([user_id], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<rusqlite::Result<HashMap<i64, Option<i64>>>>()?;
    Ok(edges)
}

pub fn get_category(conn: &Connection, user_id: i64, id: i64) -> rusqlite::Result<Option<Category>> {
    conn.query_row(
        &format!(
            "SELECT {} FROM categories WHERE id = ? AND user_id = ?",
            CATEGORY_COLUMNS
        ),
        [id, user_id],
        map_category,
    )
    .optional()
}

/// True when the user already has a category with this name under the same
/// parent. `exclude_id` skips the row being updated.
pub fn sibling_name_exists(
    conn: &Connection,
    user_id: i64,
    parent_id: Option<i64>,
    name: &str,
    exclude_id: Option<i64>,
) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(
            SELECT 1 FROM categories
            WHERE user_id = ? AND name = ? AND parent_id IS ? AND id IS NOT ?
        )",
        params![user_id, name, parent_id, exclude_id],
        |row| row.get(0),
    )
}

pub fn create_category(
    conn: &Connection,
    user_id: i64,
    category: &NewCategory,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO categories (user_id, name, color, parent_id) VALUES (?, ?, ?, ?)",
        params![user_id, category.name, category.color, category.parent_id],
    )?;
    let id = conn.last_insert_rowid();
    debug!(category_id = id, name = %category.name, "Created category");
    Ok(id)
}

pub fn update_category(
    conn: &Connection,
    user_id: i64,
    id: i64,
    category: &NewCategory,
) -> rusqlite::Result<bool> {
    let rows = conn.execute(
        "UPDATE categories SET name = ?, color = ?, parent_id = ?,
         updated_at = datetime('now') WHERE id = ? AND user_id = ?",
        params![category.name, category.color, category.parent_id, id, user_id],
    )?;
    if rows > 0 {
        debug!(category_id = id, name = %category.name, "Updated category");
    }
    Ok(rows > 0)
}

pub fn delete_category(conn: &Connection, user_id: i64, id: i64) -> rusqlite::Result<bool> {
    let rows = conn.execute(
        "DELETE FROM categories WHERE id = ? AND user_id = ?",
        [id, user_id],
    )?;
    if rows > 0 {
        debug!(category_id = id, "Deleted category");
    }
    Ok(rows > 0)
}

/// Counts of records still referencing a category. Deletion is blocked
/// while any of these are non-zero.
#[derive(Debug, Default)]
pub struct ReferenceCounts {
    pub expenses: i64,
    pub subscriptions: i64,
    pub children: i64,
}

impl ReferenceCounts {
    pub fn is_referenced(&self) -> bool {
        self.expenses > 0 || self.subscriptions > 0 || self.children > 0
    }
}

pub fn reference_counts(conn: &Connection, id: i64) -> rusqlite::Result<ReferenceCounts> {
    conn.query_row(
        "SELECT
            (SELECT COUNT(*) FROM expenses WHERE category_id = ?1),
            (SELECT COUNT(*) FROM subscriptions WHERE category_id = ?1),
            (SELECT COUNT(*) FROM categories WHERE parent_id = ?1)",
        [id],
        |row| {
            Ok(ReferenceCounts {
                expenses: row.get(0)?,
                subscriptions: row.get(1)?,
                children: row.get(2)?,
            })
        },
    )
}
