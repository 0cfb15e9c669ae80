use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: i64,
    pub user_id: i64,
    pub category_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub amount_cents: i64,
    pub currency: String,
    /// Nominal day of month the subscription bills (1-31). Days past the end
    /// of a month clamp to that month's last day.
    pub billing_day: u32,
    pub start_date: String,
    /// Exclusive upper bound: no bill is generated on or after this date.
    pub end_date: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSubscription {
    pub name: String,
    pub description: Option<String>,
    pub category_id: i64,
    pub amount_cents: i64,
    pub billing_day: u32,
    pub start_date: String,
    pub end_date: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}
