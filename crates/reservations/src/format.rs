//! Display formatting and stay calculations.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use lodge_core::Money;

const SECONDS_PER_DAY: i64 = 86_400;

/// `2025-09-01` -> `Sep 1, 2025`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// Format an optional date, empty when missing.
pub fn format_optional_date(date: Option<NaiveDate>) -> String {
    date.map(format_date).unwrap_or_default()
}

/// `Sep 1 – Sep 3, 2025` within a single year, both full dates otherwise.
///
/// Empty when either end is missing.
pub fn format_date_range(start: Option<NaiveDate>, end: Option<NaiveDate>) -> String {
    let (Some(start), Some(end)) = (start, end) else {
        return String::new();
    };
    if start.year() == end.year() {
        format!("{} – {}", start.format("%b %-d"), format_date(end))
    } else {
        format!("{} – {}", format_date(start), format_date(end))
    }
}

/// Nights between two instants: the ceiling of the day difference, never
/// below one so same-day bookings still display as a single night.
pub fn nights_between(check_in: NaiveDateTime, check_out: NaiveDateTime) -> u32 {
    let seconds = (check_out - check_in).num_seconds();
    if seconds <= 0 {
        return 1;
    }
    let days = (seconds + SECONDS_PER_DAY - 1) / SECONDS_PER_DAY;
    u32::try_from(days).unwrap_or(u32::MAX).max(1)
}

/// Nights between two calendar dates (see [`nights_between`]).
pub fn nights_between_dates(check_in: NaiveDate, check_out: NaiveDate) -> u32 {
    let days = (check_out - check_in).num_days();
    u32::try_from(days).unwrap_or(0).max(1)
}

/// `$1,234.50`; negative amounts as `-$12.00`.
pub fn format_currency(amount: Money) -> String {
    let minor = amount.minor_units();
    let sign = if minor < 0 { "-" } else { "" };
    let abs = minor.unsigned_abs();
    let whole = abs / 100;
    let cents = abs % 100;
    format!("{sign}${}.{cents:02}", group_thousands(whole))
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn formats_short_month_dates() {
        assert_eq!(format_date(date(2025, 9, 1)), "Sep 1, 2025");
        assert_eq!(format_optional_date(None), "");
    }

    #[test]
    fn date_range_collapses_shared_year() {
        assert_eq!(
            format_date_range(Some(date(2025, 9, 1)), Some(date(2025, 9, 3))),
            "Sep 1 – Sep 3, 2025"
        );
        assert_eq!(
            format_date_range(Some(date(2025, 12, 30)), Some(date(2026, 1, 2))),
            "Dec 30, 2025 – Jan 2, 2026"
        );
        assert_eq!(format_date_range(Some(date(2025, 9, 1)), None), "");
    }

    #[test]
    fn nights_use_ceiling_and_clamp_to_one() {
        assert_eq!(nights_between_dates(date(2025, 9, 1), date(2025, 9, 3)), 2);
        assert_eq!(nights_between_dates(date(2025, 9, 1), date(2025, 9, 1)), 1);
        assert_eq!(nights_between_dates(date(2025, 9, 3), date(2025, 9, 1)), 1);

        let check_in = date(2025, 9, 1).and_hms_opt(15, 0, 0).unwrap();
        let check_out = date(2025, 9, 3).and_hms_opt(11, 0, 0).unwrap();
        assert_eq!(nights_between(check_in, check_out), 2);
    }

    #[test]
    fn currency_groups_thousands() {
        assert_eq!(format_currency(Money::from_minor(123_450)), "$1,234.50");
        assert_eq!(format_currency(Money::from_minor(5)), "$0.05");
        assert_eq!(format_currency(Money::from_minor(-1200)), "-$12.00");
        assert_eq!(format_currency(Money::from_minor(100_000_000)), "$1,000,000.00");
    }
}
