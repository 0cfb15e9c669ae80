use crate::models::{NewUser, User};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

fn map_user(row: &rusqlite::Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        currency: row.get(3)?,
        monthly_budget_cents: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

const USER_COLUMNS: &str =
    "id, username, password_hash, currency, monthly_budget_cents, created_at, updated_at";

pub fn get_user(conn: &Connection, id: i64) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        &format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS),
        [id],
        map_user,
    )
    .optional()
}

pub fn get_user_by_username(conn: &Connection, username: &str) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        &format!("SELECT {} FROM users WHERE username = ?", USER_COLUMNS),
        [username],
        map_user,
    )
    .optional()
}

pub fn create_user(conn: &Connection, user: &NewUser) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO users (username, password_hash, currency) VALUES (?, ?, ?)",
        params![user.username, user.password_hash, user.currency],
    )?;
    let id = conn.last_insert_rowid();
    debug!(user_id = id, "Created user");
    Ok(id)
}

pub fn update_currency(conn: &Connection, user_id: i64, currency: &str) -> rusqlite::Result<bool> {
    let rows = conn.execute(
        "UPDATE users SET currency = ?, updated_at = datetime('now') WHERE id = ?",
        params![currency, user_id],
    )?;
    Ok(rows > 0)
}

pub fn update_monthly_budget(
    conn: &Connection,
    user_id: i64,
    monthly_budget_cents: Option<i64>,
) -> rusqlite::Result<bool> {
    let rows = conn.execute(
        "UPDATE users SET monthly_budget_cents = ?, updated_at = datetime('now') WHERE id = ?",
        params![monthly_budget_cents, user_id],
    )?;
    if rows > 0 {
        debug!(user_id, ?monthly_budget_cents, "Updated monthly budget");
    }
    Ok(rows > 0)
}
