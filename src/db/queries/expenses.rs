use crate::models::{AmountMode, Expense, NewExpense};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

#[derive(Default)]
pub struct ExpenseFilter {
    pub category_id: Option<i64>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

fn map_expense(row: &rusqlite::Row) -> rusqlite::Result<Expense> {
    let mode: String = row.get(8)?;
    Ok(Expense {
        id: row.get(0)?,
        user_id: row.get(1)?,
        category_id: row.get(2)?,
        amount_cents: row.get(3)?,
        currency: row.get(4)?,
        date: row.get(5)?,
        note: row.get(6)?,
        is_installment: row.get(7)?,
        amount_mode: AmountMode::parse(&mode),
        installment_count: row.get(9)?,
        is_next_month_payment: row.get(10)?,
        subscription_id: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

const EXPENSE_COLUMNS: &str = "id, user_id, category_id, amount_cents, currency, date, note,
     is_installment, amount_mode, installment_count, is_next_month_payment,
     subscription_id, created_at, updated_at";

pub fn list_expenses(
    conn: &Connection,
    user_id: i64,
    filter: &ExpenseFilter,
) -> rusqlite::Result<Vec<Expense>> {
    let mut sql = format!(
        "SELECT {} FROM expenses WHERE user_id = ?",
        EXPENSE_COLUMNS
    );
    let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(user_id)];

    if let Some(category_id) = filter.category_id {
        sql.push_str(" AND category_id = ?");
        params_vec.push(Box::new(category_id));
    }
    if let Some(ref from_date) = filter.from_date {
        sql.push_str(" AND date >= ?");
        params_vec.push(Box::new(from_date.clone()));
    }
    if let Some(ref to_date) = filter.to_date {
        sql.push_str(" AND date <= ?");
        params_vec.push(Box::new(to_date.clone()));
    }

    sql.push_str(" ORDER BY date DESC, id DESC");

    if filter.limit.is_some() || filter.offset.is_some() {
        // OFFSET is only valid after LIMIT; -1 means unbounded
        sql.push_str(" LIMIT ?");
        params_vec.push(Box::new(filter.limit.unwrap_or(-1)));
        if let Some(offset) = filter.offset {
            sql.push_str(" OFFSET ?");
            params_vec.push(Box::new(offset));
        }
    }

    let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
    let mut stmt = conn.prepare(&sql)?;

    let expenses = stmt
        .query_map(params_refs.as_slice(), map_expense)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    debug!(count = expenses.len(), "Listed expenses");
    Ok(expenses)
}

pub fn get_expense(conn: &Connection, user_id: i64, id: i64) -> rusqlite::Result<Option<Expense>> {
    conn.query_row(
        &format!(
            "SELECT {} FROM expenses WHERE id = ? AND user_id = ?",
            EXPENSE_COLUMNS
        ),
        [id, user_id],
        map_expense,
    )
    .optional()
}

pub fn create_expense(
    conn: &Connection,
    user_id: i64,
    expense: &NewExpense,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO expenses (user_id, category_id, amount_cents, currency, date, note,
         is_installment, installment_count, amount_mode, is_next_month_payment, subscription_id)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            user_id,
            expense.category_id,
            expense.amount_cents,
            expense.currency,
            expense.date,
            expense.note,
            expense.is_installment,
            expense.installment_count,
            expense.amount_mode.as_str(),
            expense.is_next_month_payment,
            expense.subscription_id,
        ],
    )?;

    let id = conn.last_insert_rowid();
    debug!(
        expense_id = id,
        amount_cents = expense.amount_cents,
        "Created expense"
    );
    Ok(id)
}

/// Insert a subscription-generated bill, relying on the unique
/// (subscription, period) index to drop duplicates. Returns true when a row
/// was actually inserted; a concurrent run that won the race makes this a
/// silent no-op.
pub fn insert_generated_bill(
    conn: &Connection,
    user_id: i64,
    expense: &NewExpense,
) -> rusqlite::Result<bool> {
    let rows = conn.execute(
        "INSERT OR IGNORE INTO expenses
         (user_id, category_id, amount_cents, currency, date, note,
          is_installment, installment_count, amount_mode, is_next_month_payment, subscription_id)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            user_id,
            expense.category_id,
            expense.amount_cents,
            expense.currency,
            expense.date,
            expense.note,
            expense.is_installment,
            expense.installment_count,
            expense.amount_mode.as_str(),
            expense.is_next_month_payment,
            expense.subscription_id,
        ],
    )?;
    if rows > 0 {
        debug!(
            subscription_id = ?expense.subscription_id,
            date = %expense.date,
            "Materialized subscription bill"
        );
    }
    Ok(rows > 0)
}

pub fn update_expense(
    conn: &Connection,
    user_id: i64,
    id: i64,
    expense: &NewExpense,
) -> rusqlite::Result<bool> {
    let rows = conn.execute(
        "UPDATE expenses SET category_id = ?, amount_cents = ?, currency = ?, date = ?,
         note = ?, is_installment = ?, installment_count = ?, amount_mode = ?,
         is_next_month_payment = ?, updated_at = datetime('now')
         WHERE id = ? AND user_id = ?",
        params![
            expense.category_id,
            expense.amount_cents,
            expense.currency,
            expense.date,
            expense.note,
            expense.is_installment,
            expense.installment_count,
            expense.amount_mode.as_str(),
            expense.is_next_month_payment,
            id,
            user_id,
        ],
    )?;
    if rows > 0 {
        debug!(expense_id = id, "Updated expense");
    }
    Ok(rows > 0)
}

pub fn delete_expense(conn: &Connection, user_id: i64, id: i64) -> rusqlite::Result<bool> {
    let rows = conn.execute(
        "DELETE FROM expenses WHERE id = ? AND user_id = ?",
        [id, user_id],
    )?;
    if rows > 0 {
        debug!(expense_id = id, "Deleted expense");
    }
    Ok(rows > 0)
}

/// (subscription_id, date) pairs of all generated bills, used to build the
/// billing idempotence set.
pub fn list_generated_bills(conn: &Connection, user_id: i64) -> rusqlite::Result<Vec<(i64, String)>> {
    let mut stmt = conn.prepare(
        "SELECT subscription_id, date FROM expenses
         WHERE user_id = ? AND subscription_id IS NOT NULL",
    )?;
    let rows = stmt
        .query_map([user_id], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// Total spent in a date window (inclusive bounds), for budget status.
pub fn sum_expenses_between(
    conn: &Connection,
    user_id: i64,
    from_date: &str,
    to_date: &str,
) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COALESCE(SUM(amount_cents), 0) FROM expenses
         WHERE user_id = ? AND date >= ? AND date <= ?",
        params![user_id, from_date, to_date],
        |row| row.get(0),
    )
}
