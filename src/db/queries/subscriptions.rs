use crate::models::{NewSubscription, Subscription};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

fn map_subscription(row: &rusqlite::Row) -> rusqlite::Result<Subscription> {
    Ok(Subscription {
        id: row.get(0)?,
        user_id: row.get(1)?,
        category_id: row.get(2)?,
        name: row.get(3)?,
        description: row.get(4)?,
        amount_cents: row.get(5)?,
        currency: row.get(6)?,
        billing_day: row.get(7)?,
        start_date: row.get(8)?,
        end_date: row.get(9)?,
        is_active: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

const SUBSCRIPTION_COLUMNS: &str = "id, user_id, category_id, name, description, amount_cents,
     currency, billing_day, start_date, end_date, is_active, created_at, updated_at";

/// All of the user's subscriptions, active and paused. Bill generation
/// filters on `is_active` itself.
pub fn list_subscriptions(conn: &Connection, user_id: i64) -> rusqlite::Result<Vec<Subscription>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM subscriptions WHERE user_id = ? ORDER BY id",
        SUBSCRIPTION_COLUMNS
    ))?;

    let subscriptions = stmt
        .query_map([user_id], map_subscription)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(subscriptions)
}

pub fn get_subscription(
    conn: &Connection,
    user_id: i64,
    id: i64,
) -> rusqlite::Result<Option<Subscription>> {
    conn.query_row(
        &format!(
            "SELECT {} FROM subscriptions WHERE id = ? AND user_id = ?",
            SUBSCRIPTION_COLUMNS
        ),
        [id, user_id],
        map_subscription,
    )
    .optional()
}

pub fn create_subscription(
    conn: &Connection,
    user_id: i64,
    currency: &str,
    subscription: &NewSubscription,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO subscriptions (user_id, category_id, name, description, amount_cents,
         currency, billing_day, start_date, end_date, is_active)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            user_id,
            subscription.category_id,
            subscription.name,
            subscription.description,
            subscription.amount_cents,
            currency,
            subscription.billing_day,
            subscription.start_date,
            subscription.end_date,
            subscription.is_active,
        ],
    )?;
    let id = conn.last_insert_rowid();
    debug!(subscription_id = id, name = %subscription.name, "Created subscription");
    Ok(id)
}

pub fn update_subscription(
    conn: &Connection,
    user_id: i64,
    id: i64,
    subscription: &NewSubscription,
) -> rusqlite::Result<bool> {
    let rows = conn.execute(
        "UPDATE subscriptions SET category_id = ?, name = ?, description = ?,
         amount_cents = ?, billing_day = ?, start_date = ?, end_date = ?, is_active = ?,
         updated_at = datetime('now')
         WHERE id = ? AND user_id = ?",
        params![
            subscription.category_id,
            subscription.name,
            subscription.description,
            subscription.amount_cents,
            subscription.billing_day,
            subscription.start_date,
            subscription.end_date,
            subscription.is_active,
            id,
            user_id,
        ],
    )?;
    if rows > 0 {
        debug!(subscription_id = id, "Updated subscription");
    }
    Ok(rows > 0)
}

/// Delete a subscription. Generated expenses keep their back-reference and
/// survive; there is no cascade.
pub fn delete_subscription(conn: &Connection, user_id: i64, id: i64) -> rusqlite::Result<bool> {
    let rows = conn.execute(
        "DELETE FROM subscriptions WHERE id = ? AND user_id = ?",
        [id, user_id],
    )?;
    if rows > 0 {
        debug!(subscription_id = id, "Deleted subscription");
    }
    Ok(rows > 0)
}
