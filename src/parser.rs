//! Coercion of loosely-typed API and CSV cells into numbers and dates.
//!
//! Both services deliver numbers as strings more often than not, and dates in
//! a handful of layouts. Anything that does not parse becomes `None`; nothing
//! is ever coerced to zero.

use chrono::NaiveDate;
use serde_json::Value;

/// Day-granularity layouts, tried in order.
const DAY_FORMATS: &[&str] = &["%Y-%m-%d", "%Y.%m.%d", "%Y/%m/%d", "%Y%m%d"];

/// Month-only layouts paired with the separator used to append a day.
const MONTH_FORMATS: &[(&str, &str)] = &[("%Y-%m-%d", "-"), ("%Y.%m.%d", "."), ("%Y/%m/%d", "/")];

/// Parses a numeric cell. Blank, non-numeric and non-finite text yields `None`.
pub fn parse_number(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    raw.replace(',', "")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Parses a calendar date.
///
/// Accepts `YYYY-MM-DD`, `YYYY.MM.DD`, `YYYY/MM/DD` and `YYYYMMDD`, optionally
/// followed by a time of day, plus month-only `YYYY-MM`, `YYYY.MM`, `YYYY/MM`
/// and `YYYYMM` which are anchored to the first day of the month.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim().trim_end_matches('.');
    if raw.is_empty() {
        return None;
    }

    // Drop a trailing time of day ("2023-01-05 10:30:00", "2023-01-05T10:30").
    let day_part = raw
        .split(|c: char| c == ' ' || c == 'T')
        .next()
        .unwrap_or(raw);

    for fmt in DAY_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(day_part, fmt) {
            return Some(date);
        }
    }

    if day_part.len() == 6 && day_part.chars().all(|c| c.is_ascii_digit()) {
        return NaiveDate::parse_from_str(&format!("{day_part}01"), "%Y%m%d").ok();
    }

    MONTH_FORMATS.iter().find_map(|(fmt, sep)| {
        NaiveDate::parse_from_str(&format!("{day_part}{sep}01"), fmt).ok()
    })
}

/// Coerces a JSON value into a number.
pub fn value_as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_number(s),
        _ => None,
    }
}

/// Coerces a JSON value into a date. Integers such as `20230105` are read as
/// their decimal digits.
pub fn value_as_date(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::String(s) => parse_date(s),
        Value::Number(n) => n.as_u64().and_then(|n| parse_date(&n.to_string())),
        _ => None,
    }
}

/// Coerces a JSON value into a non-empty trimmed string.
pub fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
