//! Resolution of date-relative sub-operators against "now".

use crate::error::{FilterError, Result};
use crate::filter::ComparisonSubOp;
use chrono::{DateTime, Datelike, Days, Months, NaiveDate, Utc};

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

/// The display format that makes a date column month-granular.
pub(crate) const MONTH_FORMAT: &str = "YYYY-MM";

/// Today's date, or the first of the month for month-granular columns.
pub(crate) fn today(now: DateTime<Utc>, month_granular: bool) -> NaiveDate {
    let date = now.date_naive();
    if month_granular {
        first_of_month(date)
    } else {
        date
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Parses the date part of an explicit value (`2024-03-05` or a timestamp
/// starting with one).
pub(crate) fn parse_date(value: &str) -> Option<NaiveDate> {
    let head = value.get(..10).unwrap_or(value);
    NaiveDate::parse_from_str(head, DATE_FORMAT).ok()
}

/// A bare `YYYY-MM-DD` date with no time part.
pub(crate) fn is_date_only(value: &str) -> bool {
    value.len() == 10 && parse_date(value).is_some()
}

/// Resets an explicit value to the first of its month.
pub(crate) fn month_start(field: &str, value: &str) -> Result<String> {
    parse_date(value)
        .map(|date| first_of_month(date).format(DATE_FORMAT).to_string())
        .ok_or_else(|| invalid(field, value, "expected a date in YYYY-MM-DD form"))
}

/// Computes the concrete comparison date for `sub_op`.
///
/// `daysAgo`, `daysFromNow`, `pastNumberOfDays` and `nextNumberOfDays` take
/// a day count from `value`; `exactDate` takes the date itself.
pub(crate) fn resolve(
    sub_op: ComparisonSubOp,
    value: Option<&str>,
    now: DateTime<Utc>,
    month_granular: bool,
    field: &str,
) -> Result<String> {
    let base = today(now, month_granular);
    let date = match sub_op {
        ComparisonSubOp::Today => Some(base),
        ComparisonSubOp::Tomorrow => shift_days(base, 1),
        ComparisonSubOp::Yesterday => shift_days(base, -1),
        ComparisonSubOp::OneWeekAgo | ComparisonSubOp::PastWeek => shift_days(base, -7),
        ComparisonSubOp::OneWeekFromNow | ComparisonSubOp::NextWeek => shift_days(base, 7),
        ComparisonSubOp::OneMonthAgo | ComparisonSubOp::PastMonth => shift_months(base, -1),
        ComparisonSubOp::OneMonthFromNow | ComparisonSubOp::NextMonth => shift_months(base, 1),
        ComparisonSubOp::PastYear => shift_months(base, -12),
        ComparisonSubOp::NextYear => shift_months(base, 12),
        ComparisonSubOp::DaysAgo | ComparisonSubOp::PastNumberOfDays => {
            let days = day_count(sub_op, value, field)?;
            shift_days(base, -days)
        }
        ComparisonSubOp::DaysFromNow | ComparisonSubOp::NextNumberOfDays => {
            let days = day_count(sub_op, value, field)?;
            shift_days(base, days)
        }
        ComparisonSubOp::ExactDate => {
            let value = required(sub_op, value, field)?;
            let date = parse_date(value)
                .ok_or_else(|| invalid(field, value, "expected a date in YYYY-MM-DD form"))?;
            Some(if month_granular {
                first_of_month(date)
            } else {
                date
            })
        }
    };
    date.map(|d| d.format(DATE_FORMAT).to_string())
        .ok_or_else(|| invalid(field, value.unwrap_or(""), "date out of range"))
}

fn required<'v>(sub_op: ComparisonSubOp, value: Option<&'v str>, field: &str) -> Result<&'v str> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(FilterError::MissingValue {
            op: sub_op.to_string(),
            field: field.to_string(),
        }),
    }
}

fn day_count(sub_op: ComparisonSubOp, value: Option<&str>, field: &str) -> Result<i64> {
    let value = required(sub_op, value, field)?;
    value
        .parse::<i64>()
        .map_err(|_| invalid(field, value, "expected a whole number of days"))
}

fn shift_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    let magnitude = Days::new(days.unsigned_abs());
    if days >= 0 {
        date.checked_add_days(magnitude)
    } else {
        date.checked_sub_days(magnitude)
    }
}

fn shift_months(date: NaiveDate, months: i32) -> Option<NaiveDate> {
    let magnitude = Months::new(months.unsigned_abs());
    if months >= 0 {
        date.checked_add_months(magnitude)
    } else {
        date.checked_sub_months(magnitude)
    }
}

fn invalid(field: &str, value: &str, reason: &str) -> FilterError {
    FilterError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 31, 15, 30, 0).unwrap()
    }

    fn resolve_ok(sub_op: ComparisonSubOp, value: Option<&str>) -> String {
        resolve(sub_op, value, now(), false, "Due").unwrap()
    }

    #[test]
    fn test_fixed_offsets() {
        assert_eq!(resolve_ok(ComparisonSubOp::Today, None), "2024-03-31");
        assert_eq!(resolve_ok(ComparisonSubOp::Tomorrow, None), "2024-04-01");
        assert_eq!(resolve_ok(ComparisonSubOp::Yesterday, None), "2024-03-30");
        assert_eq!(resolve_ok(ComparisonSubOp::OneWeekAgo, None), "2024-03-24");
        assert_eq!(resolve_ok(ComparisonSubOp::NextWeek, None), "2024-04-07");
        // 月末按目标月份的最后一天截断
        assert_eq!(resolve_ok(ComparisonSubOp::OneMonthAgo, None), "2024-02-29");
        assert_eq!(resolve_ok(ComparisonSubOp::OneMonthFromNow, None), "2024-04-30");
        assert_eq!(resolve_ok(ComparisonSubOp::PastYear, None), "2023-03-31");
        assert_eq!(resolve_ok(ComparisonSubOp::NextYear, None), "2025-03-31");
    }

    #[test]
    fn test_day_counts() {
        assert_eq!(resolve_ok(ComparisonSubOp::DaysAgo, Some("3")), "2024-03-28");
        assert_eq!(resolve_ok(ComparisonSubOp::DaysFromNow, Some("1")), "2024-04-01");
        assert_eq!(resolve_ok(ComparisonSubOp::PastNumberOfDays, Some("31")), "2024-02-29");
        assert_eq!(resolve_ok(ComparisonSubOp::NextNumberOfDays, Some("10")), "2024-04-10");
    }

    #[test]
    fn test_day_count_requires_value() {
        let err = resolve(ComparisonSubOp::DaysAgo, None, now(), false, "Due").unwrap_err();
        assert!(matches!(err, FilterError::MissingValue { ref op, .. } if op == "daysAgo"));

        let err = resolve(ComparisonSubOp::DaysAgo, Some("soon"), now(), false, "Due").unwrap_err();
        assert!(matches!(err, FilterError::InvalidValue { .. }));
    }

    #[test]
    fn test_exact_date() {
        assert_eq!(resolve_ok(ComparisonSubOp::ExactDate, Some("2023-12-25")), "2023-12-25");
        assert_eq!(
            resolve_ok(ComparisonSubOp::ExactDate, Some("2023-12-25T10:00:00Z")),
            "2023-12-25"
        );
        let err = resolve(ComparisonSubOp::ExactDate, None, now(), false, "Due").unwrap_err();
        assert!(matches!(err, FilterError::MissingValue { .. }));
    }

    #[test]
    fn test_month_granular() {
        let today = resolve(ComparisonSubOp::Today, None, now(), true, "Month").unwrap();
        assert_eq!(today, "2024-03-01");
        let exact = resolve(ComparisonSubOp::ExactDate, Some("2023-07-19"), now(), true, "Month").unwrap();
        assert_eq!(exact, "2023-07-01");
        assert_eq!(month_start("Month", "2022-11-30").unwrap(), "2022-11-01");
        assert!(month_start("Month", "November").is_err());
    }
}
