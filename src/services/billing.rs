//! Subscription bill generation.
//!
//! There is no background scheduler: any caller (in practice the dashboard
//! load) invokes [`compute_due_bills`] with a fresh snapshot of the user's
//! subscriptions and already-generated expenses plus the current date, and
//! persists whatever comes back. The computation is deterministic and
//! idempotent — a period already present in the existing-bill set is never
//! emitted again, so re-running it is always safe. Cross-request races are
//! settled by the storage layer's unique (subscription, period) index, not
//! here.

use std::collections::HashSet;

use chrono::NaiveDate;

use crate::date_utils::{effective_billing_date, next_month, year_month};
use crate::models::{AmountMode, NewExpense, Subscription};

/// One subscription billing period that is due and not yet materialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillDescriptor {
    pub subscription_id: i64,
    pub period_year: i32,
    pub period_month: u32,
    pub billing_date: NaiveDate,
    pub amount_cents: i64,
    pub currency: String,
    pub category_id: i64,
}

impl BillDescriptor {
    /// Deterministic mapping to a persistable expense record. Generated
    /// bills carry default flags and the subscription back-reference.
    pub fn to_new_expense(&self, note: Option<String>) -> NewExpense {
        NewExpense {
            category_id: self.category_id,
            amount_cents: self.amount_cents,
            currency: self.currency.clone(),
            date: self.billing_date.format("%Y-%m-%d").to_string(),
            note,
            is_installment: false,
            installment_count: None,
            amount_mode: AmountMode::Total,
            is_next_month_payment: false,
            subscription_id: Some(self.subscription_id),
        }
    }
}

/// Result of one bill-generation pass. Warnings cover subscriptions that
/// were skipped over data-integrity problems; they never abort the run.
#[derive(Debug, Default)]
pub struct BillingRun {
    pub bills: Vec<BillDescriptor>,
    pub warnings: Vec<String>,
}

/// The set of (subscription id, year, month) periods already materialized.
pub type ExistingPeriods = HashSet<(i64, i32, u32)>;

/// Build the idempotence set from (subscription_id, date) pairs of
/// previously generated expenses.
pub fn existing_periods(rows: &[(i64, String)]) -> ExistingPeriods {
    rows.iter()
        .filter_map(|(subscription_id, date)| {
            NaiveDate::parse_from_str(date, "%Y-%m-%d").ok().map(|d| {
                let (year, month) = year_month(d);
                (*subscription_id, year, month)
            })
        })
        .collect()
}

/// Compute every billing period that is due as of `as_of` and not yet
/// represented in `existing`, in ascending (subscription, year, month) order.
pub fn compute_due_bills(
    subscriptions: &[Subscription],
    existing: &ExistingPeriods,
    as_of: NaiveDate,
) -> BillingRun {
    let mut run = BillingRun::default();

    for sub in subscriptions {
        if !sub.is_active {
            continue;
        }

        let Ok(start_date) = NaiveDate::parse_from_str(&sub.start_date, "%Y-%m-%d") else {
            warn_skip(&mut run, sub.id, "unparseable start date");
            continue;
        };
        let end_date = match &sub.end_date {
            Some(s) => match NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                Ok(d) => Some(d),
                Err(_) => {
                    warn_skip(&mut run, sub.id, "unparseable end date");
                    continue;
                }
            },
            None => None,
        };
        // Creation-time validation guarantees end > start; tolerate a
        // violating row without blocking the other subscriptions.
        if let Some(end) = end_date {
            if end <= start_date {
                warn_skip(&mut run, sub.id, "end date is not after start date");
                continue;
            }
        }

        let (mut year, mut month) = year_month(start_date);
        let as_of_period = year_month(as_of);

        while (year, month) <= as_of_period {
            let period = (year, month);
            (year, month) = next_month(year, month);

            let Some(billing_date) = effective_billing_date(period.0, period.1, sub.billing_day)
            else {
                continue;
            };
            if billing_date < start_date || billing_date > as_of {
                continue;
            }
            if let Some(end) = end_date {
                // end_date is an exclusive bound
                if billing_date >= end {
                    continue;
                }
            }
            if existing.contains(&(sub.id, period.0, period.1)) {
                continue;
            }

            run.bills.push(BillDescriptor {
                subscription_id: sub.id,
                period_year: period.0,
                period_month: period.1,
                billing_date,
                amount_cents: sub.amount_cents,
                currency: sub.currency.clone(),
                category_id: sub.category_id,
            });
        }
    }

    run.bills
        .sort_by_key(|b| (b.subscription_id, b.period_year, b.period_month));
    run
}

fn warn_skip(run: &mut BillingRun, subscription_id: i64, reason: &str) {
    tracing::warn!(
        subscription_id,
        reason,
        "Skipping subscription during bill generation"
    );
    run.warnings
        .push(format!("subscription {}: {}", subscription_id, reason));
}
