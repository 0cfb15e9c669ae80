use serde::{Deserialize, Serialize};

/// How the submitted amount of an installment purchase is interpreted.
///
/// `PerInstallment` amounts are expanded to a stored total once, at creation
/// time. Core logic only ever sees totals; the optionality of the original
/// form field is resolved at the API boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountMode {
    #[default]
    Total,
    PerInstallment,
}

impl AmountMode {
    pub fn as_str(self) -> &'static str {
        match self {
            AmountMode::Total => "total",
            AmountMode::PerInstallment => "per_installment",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "per_installment" => AmountMode::PerInstallment,
            _ => AmountMode::Total,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    pub user_id: i64,
    pub category_id: i64,
    pub amount_cents: i64,
    pub currency: String,
    pub date: String,
    pub note: Option<String>,
    pub is_installment: bool,
    pub installment_count: Option<i64>,
    pub amount_mode: AmountMode,
    pub is_next_month_payment: bool,
    /// Set when this record was generated from a subscription billing period.
    pub subscription_id: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct NewExpense {
    pub category_id: i64,
    pub amount_cents: i64,
    pub currency: String,
    pub date: String,
    pub note: Option<String>,
    pub is_installment: bool,
    pub installment_count: Option<i64>,
    pub amount_mode: AmountMode,
    pub is_next_month_payment: bool,
    pub subscription_id: Option<i64>,
}
