use chrono::{DateTime, Duration, NaiveDate};
use models::MonthKey;

/// Days credited per fractional month when projecting a completion date.
const DAYS_PER_MONTH: f64 = 30.0;

/// Moves `start` forward by `months` calendar months, carrying into the year.
///
/// Returns `None` when the result leaves the four digit year range.
pub fn add_months(start: MonthKey, months: u32) -> Option<MonthKey> {
    let offset = i64::from(start.month()) - 1 + i64::from(months);
    let year = i64::from(start.year()) + offset.div_euclid(12);
    let month = offset.rem_euclid(12) + 1;
    MonthKey::new(i32::try_from(year).ok()?, u32::try_from(month).ok()?)
}

/// Whole calendar months from `from` to `to`, ignoring days. Negative when `to` is earlier.
pub fn months_between(from: MonthKey, to: MonthKey) -> i64 {
    (i64::from(to.year()) - i64::from(from.year())) * 12
        + (i64::from(to.month()) - i64::from(from.month()))
}

/// Parses a goal's target date (YYYY-MM-DD, YYYY/MM/DD or an RFC 3339 timestamp).
pub fn parse_target_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y/%m/%d"))
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

/// Date reached after `months` from the first day of `base`: whole months are
/// added on the calendar, the fraction as 30-day months rounded to a day.
pub fn project_completion_date(base: MonthKey, months: f64) -> Option<NaiveDate> {
    if !months.is_finite() || months < 0.0 {
        return None;
    }
    let whole = months.trunc();
    if whole > f64::from(u32::MAX) {
        return None;
    }
    let fraction = months - whole;
    let month = add_months(base, whole as u32)?;
    let days = (DAYS_PER_MONTH * fraction).round() as i64;
    month.first_day()?.checked_add_signed(Duration::days(days))
}
