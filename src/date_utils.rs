//! Shared date and billing-period helpers.
//!
//! Billing periods are (year, month) pairs; a subscription generates at most
//! one expense per period. The billing day is clamped to the length of the
//! month when the nominal day does not exist (billing day 31 in February).

use chrono::{Datelike, NaiveDate};

/// Number of days in the given month, accounting for leap years.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    match next {
        Some(first_of_next) => first_of_next.pred_opt().map(|d| d.day()).unwrap_or(28),
        None => 28,
    }
}

/// The date a subscription bills in the given month: the billing day, clamped
/// to the last day of the month.
pub fn effective_billing_date(year: i32, month: u32, billing_day: u32) -> Option<NaiveDate> {
    let day = billing_day.min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day)
}

/// The (year, month) billing period containing a date.
pub fn year_month(date: NaiveDate) -> (i32, u32) {
    (date.year(), date.month())
}

/// The period immediately after the given one.
pub fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

/// First day of the month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date)
}

/// Last day of the month containing `date`.
pub fn month_end(date: NaiveDate) -> NaiveDate {
    let (y, m) = year_month(date);
    NaiveDate::from_ymd_opt(y, m, days_in_month(y, m)).unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2024, 1), 31);
        assert_eq!(days_in_month(2024, 4), 30);
        assert_eq!(days_in_month(2024, 12), 31);
    }

    #[test]
    fn test_effective_billing_date_clamps_short_months() {
        assert_eq!(
            effective_billing_date(2024, 2, 31),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
        assert_eq!(
            effective_billing_date(2023, 2, 31),
            NaiveDate::from_ymd_opt(2023, 2, 28)
        );
        assert_eq!(
            effective_billing_date(2024, 1, 31),
            NaiveDate::from_ymd_opt(2024, 1, 31)
        );
        assert_eq!(
            effective_billing_date(2024, 4, 31),
            NaiveDate::from_ymd_opt(2024, 4, 30)
        );
    }

    #[test]
    fn test_next_month_wraps_year() {
        assert_eq!(next_month(2024, 12), (2025, 1));
        assert_eq!(next_month(2024, 1), (2024, 2));
    }

    #[test]
    fn test_month_bounds() {
        let d = NaiveDate::from_ymd_opt(2024, 2, 15).unwrap();
        assert_eq!(month_start(d), NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(month_end(d), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }
}
