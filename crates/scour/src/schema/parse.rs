//! Explicit coercion rules for raw text cells.
//!
//! Numeric noise accepted before conversion:
//! - surrounding whitespace
//! - `,` thousands separators (`1,250.5`)
//!
//! Datetime formats, tried in order after any caller-supplied format:
//! RFC 3339, then [`DATETIME_FORMATS`], then [`DATE_FORMATS`] at midnight.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

use super::types::ColumnType;

/// Date-and-time formats accepted without a caller-supplied format.
pub const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
];

/// Date-only formats accepted without a caller-supplied format.
///
/// Day-first is tried before month-first, so `03/04/2020` is 3 April.
pub const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d/%m/%Y",
    "%m/%d/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%b %d, %Y",
    "%d %b %Y",
    "%B %d, %Y",
    "%d %B %Y",
];

static THOUSANDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?\d{1,3}(,\d{3})+(\.\d+)?$").unwrap());

/// Check if a raw cell represents a missing value.
pub fn is_null_value(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("na")
        || trimmed.eq_ignore_ascii_case("n/a")
        || trimmed.eq_ignore_ascii_case("nan")
        || trimmed.eq_ignore_ascii_case("null")
        || trimmed.eq_ignore_ascii_case("none")
        || trimmed.eq_ignore_ascii_case("nil")
        || trimmed == "."
        || trimmed == "-"
}

/// Parse a number, tolerating surrounding whitespace and thousands separators.
///
/// Non-finite results (`inf`, `NaN`) are rejected.
pub fn parse_number(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    let parsed = if trimmed.contains(',') {
        if !THOUSANDS.is_match(trimmed) {
            return None;
        }
        trimmed.replace(',', "").parse::<f64>().ok()?
    } else {
        trimmed.parse::<f64>().ok()?
    };

    parsed.is_finite().then_some(parsed)
}

/// Parse a boolean word.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" => Some(true),
        "false" | "no" => Some(false),
        _ => None,
    }
}

/// Parse a datetime with a single explicit format.
///
/// Date-only formats are accepted and resolve to midnight.
pub fn parse_with_format(value: &str, format: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    NaiveDateTime::parse_from_str(trimmed, format)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(trimmed, format)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Parse a datetime, trying `format` first and then the accepted formats.
pub fn parse_datetime(value: &str, format: Option<&str>) -> Option<NaiveDateTime> {
    if let Some(fmt) = format {
        if let Some(dt) = parse_with_format(value, fmt) {
            return Some(dt);
        }
    }

    let trimmed = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_utc());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .or_else(|| {
            DATE_FORMATS.iter().find_map(|fmt| {
                NaiveDate::parse_from_str(trimmed, fmt)
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })
        })
}

/// Detect the narrowest type a single non-missing raw cell fits.
pub fn detect_value_type(value: &str) -> ColumnType {
    if parse_bool(value).is_some() {
        return ColumnType::Boolean;
    }
    if parse_number(value).is_some() {
        return ColumnType::Numeric;
    }
    if parse_datetime(value, None).is_some() {
        return ColumnType::DateTime;
    }
    ColumnType::Text
}

/// Infer a column type from raw cells: every non-missing cell must agree.
pub fn infer_column_type<'a>(values: impl Iterator<Item = &'a str>) -> ColumnType {
    let mut inferred: Option<ColumnType> = None;

    for value in values.filter(|v| !is_null_value(v)) {
        let detected = detect_value_type(value);
        match inferred {
            None => inferred = Some(detected),
            Some(t) if t == detected => {}
            Some(_) => return ColumnType::Text,
        }
    }

    inferred.unwrap_or(ColumnType::Text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_null_value() {
        assert!(is_null_value(""));
        assert!(is_null_value("NA"));
        assert!(is_null_value("n/a"));
        assert!(is_null_value("null"));
        assert!(is_null_value("."));
        assert!(!is_null_value("value"));
        assert!(!is_null_value("0"));
    }

    #[test]
    fn test_parse_number_noise() {
        assert_eq!(parse_number("  42 "), Some(42.0));
        assert_eq!(parse_number("1,000"), Some(1000.0));
        assert_eq!(parse_number("-2,500.75"), Some(-2500.75));
        assert_eq!(parse_number("1,00"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("twelve"), None);
    }

    #[test]
    fn test_parse_datetime_fallbacks() {
        let iso = parse_datetime("2020-01-15", None).unwrap();
        assert_eq!(iso.to_string(), "2020-01-15 00:00:00");

        let day_first = parse_datetime("03/04/2020", None).unwrap();
        assert_eq!(day_first.format("%Y-%m-%d").to_string(), "2020-04-03");

        let explicit = parse_datetime("03/04/2020", Some("%m/%d/%Y")).unwrap();
        assert_eq!(explicit.format("%Y-%m-%d").to_string(), "2020-03-04");

        assert!(parse_datetime("not a date", None).is_none());
    }

    #[test]
    fn test_infer_column_type() {
        assert_eq!(infer_column_type(["1", "2.5", "NA"].into_iter()), ColumnType::Numeric);
        assert_eq!(infer_column_type(["yes", "no"].into_iter()), ColumnType::Boolean);
        assert_eq!(
            infer_column_type(["2020-01-01", "2020-02-01"].into_iter()),
            ColumnType::DateTime
        );
        assert_eq!(infer_column_type(["UK", "1"].into_iter()), ColumnType::Text);
        assert_eq!(infer_column_type(["", "NA"].into_iter()), ColumnType::Text);
    }
}
