//! Culture-invariant text form of setting values.
//!
//! Every value in the mapping is a string.  Typed setters format their input
//! with the rules below, and typed getters parse it back.  The rules never
//! depend on the host locale:
//!
//! | Type      | Example stored text                   |
//! |-----------|---------------------------------------|
//! | `i32`     | `-42`                                 |
//! | `f64`     | `1234.50`                             |
//! | date-time | `2020-12-24T08:12:20.0000000+01:00`   |
//!
//! # Lenient parsing
//!
//! Parsing is deliberately forgiving: surrounding whitespace is ignored and
//! `,` group separators are accepted for numbers, so files written by tools
//! that group thousands still load.  A value that cannot be parsed yields
//! `None`, which the store turns into the type's zero value.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};

/// Number of fraction digits written for decimal values.
pub const DECIMAL_FRACTION_DIGITS: usize = 2;

/// Offset-less layouts accepted by [`parse_date_time`], tried in order.
const NAIVE_DATE_TIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Returns the canonical lookup identity of `key`.
///
/// Keys are compared case-insensitively by lowercasing them before every
/// read or write.  The empty string stays the empty string.
pub fn normalize_key(key: &str) -> String {
    key.to_lowercase()
}

/// The zero value returned by date-time getters: the earliest representable
/// instant, expressed in UTC.
pub fn min_date_time() -> DateTime<FixedOffset> {
    DateTime::<Utc>::MIN_UTC.fixed_offset()
}

// ── Formatting ────────────────────────────────────────────────────────────────

/// Formats an integer as plain base-10 digits with an optional leading `-`.
pub fn format_int(value: i32) -> String {
    value.to_string()
}

/// Formats a decimal in fixed-point notation with two fraction digits.
///
/// Values exactly halfway between two outputs round away from zero
/// (`0.125` becomes `0.13`).  No group separators are written.  Negative
/// values that round to zero are written as `0.00`.
pub fn format_decimal(value: f64) -> String {
    // `{:.2}` alone would round exact midpoints to even.
    let rounded = if is_fraction_midpoint(value) {
        let scale = 10f64.powi(DECIMAL_FRACTION_DIGITS as i32);
        (value * scale).round() / scale
    } else {
        value
    };
    let text = format!("{rounded:.prec$}", prec = DECIMAL_FRACTION_DIGITS);
    match text.strip_prefix('-') {
        Some(rest) if rest.bytes().all(|b| b == b'0' || b == b'.') => rest.to_string(),
        _ => text,
    }
}

/// `true` when `value` lies exactly halfway between two multiples of
/// `10^-DECIMAL_FRACTION_DIGITS`.
///
/// Such a midpoint `(2m + 1) / (2 * 10^d)` is a binary fraction only when it
/// reduces to an odd multiple of `2^-(d + 1)`, so the test is exact.
fn is_fraction_midpoint(value: f64) -> bool {
    let halves = value * 2f64.powi(DECIMAL_FRACTION_DIGITS as i32 + 1);
    halves.is_finite() && halves.fract() == 0.0 && halves % 2.0 != 0.0
}

/// Formats a date-time as `yyyy-MM-ddTHH:mm:ss.fffffff±hh:mm`.
///
/// Seven fraction digits (100 ns resolution) are always written and the UTC
/// offset is preserved, so the text sorts lexicographically by wall-clock
/// time within one offset and round-trips through [`parse_date_time`].
pub fn format_date_time(value: &DateTime<FixedOffset>) -> String {
    // A leap second is reported as nanosecond >= 1_000_000_000.
    let ticks = (value.nanosecond() % 1_000_000_000) / 100;
    format!(
        "{}.{:07}{}",
        value.format("%Y-%m-%dT%H:%M:%S"),
        ticks,
        value.format("%:z")
    )
}

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parses an integer written by [`format_int`] or a compatible tool.
///
/// Decimal text with no fractional part (`42.00`, `4.2e1`) is accepted as
/// long as it fits in an `i32`.
pub fn parse_int(text: &str) -> Option<i32> {
    let digits = strip_group_separators(text);
    digits.parse().ok().or_else(|| {
        parse_decimal(&digits)
            .filter(|value| value.fract() == 0.0)
            .filter(|value| (f64::from(i32::MIN)..=f64::from(i32::MAX)).contains(value))
            .map(|value| value as i32)
    })
}

/// Parses a decimal written by [`format_decimal`] or a compatible tool.
///
/// Exponent notation and accounting negatives (`(42.5)`) are accepted;
/// `NaN` and infinities are not.
pub fn parse_decimal(text: &str) -> Option<f64> {
    let digits = strip_group_separators(text);
    let (negate, digits) = match digits.strip_prefix('(').and_then(|d| d.strip_suffix(')')) {
        Some(inner) => (true, inner.trim()),
        None => (false, digits.as_str()),
    };
    let value = digits.parse::<f64>().ok().filter(|value| value.is_finite())?;
    Some(if negate { -value } else { value })
}

/// Parses a date-time written by [`format_date_time`] or a compatible tool.
///
/// RFC 3339 text keeps its offset.  Text without an offset
/// (`2020-12-24T08:12:20`, `2020-12-24 08:12:20`, `2020-12-24`) is read as
/// local time.
pub fn parse_date_time(text: &str) -> Option<DateTime<FixedOffset>> {
    let text = text.trim();

    if let Ok(value) = DateTime::parse_from_rfc3339(text) {
        return Some(value);
    }

    for format in NAIVE_DATE_TIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return assume_local(naive);
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .and_then(assume_local)
}

fn strip_group_separators(text: &str) -> String {
    text.trim().chars().filter(|c| *c != ',').collect()
}

fn assume_local(naive: NaiveDateTime) -> Option<DateTime<FixedOffset>> {
    // `earliest` picks the first candidate during a DST fold; a time that
    // falls in a DST gap has no local representation and yields `None`.
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| local.fixed_offset())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offset_date_time(text: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(text).expect("valid RFC 3339 fixture")
    }

    // ── Keys ──────────────────────────────────────────────────────────────────

    #[test]
    fn test_normalize_key_lowercases() {
        assert_eq!(normalize_key("String_Value_1"), "string_value_1");
    }

    #[test]
    fn test_normalize_key_keeps_empty_key_empty() {
        assert_eq!(normalize_key(""), "");
    }

    // ── Integers ──────────────────────────────────────────────────────────────

    #[test]
    fn test_format_int_writes_plain_digits() {
        assert_eq!(format_int(42), "42");
        assert_eq!(format_int(-1_234_567), "-1234567");
    }

    #[test]
    fn test_parse_int_accepts_whitespace_and_group_separators() {
        assert_eq!(parse_int("  42 "), Some(42));
        assert_eq!(parse_int("1,234"), Some(1234));
        assert_eq!(parse_int("+7"), Some(7));
    }

    #[test]
    fn test_parse_int_rejects_non_numeric_text() {
        assert_eq!(parse_int("My fancy string"), None);
        assert_eq!(parse_int(""), None);
    }

    #[test]
    fn test_parse_int_rejects_out_of_range_value() {
        assert_eq!(parse_int("99999999999"), None);
        assert_eq!(parse_int("99999999999.00"), None);
    }

    #[test]
    fn test_parse_int_accepts_whole_decimal_and_accounting_forms() {
        assert_eq!(parse_int("42.00"), Some(42));
        assert_eq!(parse_int("4.2e1"), Some(42));
        assert_eq!(parse_int("(42)"), Some(-42));
        assert_eq!(parse_int("1,234.00"), Some(1234));
    }

    #[test]
    fn test_parse_int_rejects_fractional_text() {
        assert_eq!(parse_int("42.5"), None);
        assert_eq!(parse_int("0.01"), None);
    }

    // ── Decimals ──────────────────────────────────────────────────────────────

    #[test]
    fn test_format_decimal_uses_two_fraction_digits() {
        assert_eq!(format_decimal(100.2), "100.20");
        assert_eq!(format_decimal(42.43), "42.43");
        assert_eq!(format_decimal(7.0), "7.00");
    }

    #[test]
    fn test_format_decimal_has_no_group_separators() {
        assert_eq!(format_decimal(1_234_567.891), "1234567.89");
    }

    #[test]
    fn test_format_decimal_does_not_write_negative_zero() {
        assert_eq!(format_decimal(-0.001), "0.00");
        assert_eq!(format_decimal(-1.5), "-1.50");
    }

    #[test]
    fn test_format_decimal_rounds_midpoints_away_from_zero() {
        assert_eq!(format_decimal(0.125), "0.13");
        assert_eq!(format_decimal(-0.125), "-0.13");
        assert_eq!(format_decimal(0.625), "0.63");
        assert_eq!(format_decimal(123_456_789.125), "123456789.13");
        assert_eq!(format_decimal(2.5), "2.50");
    }

    #[test]
    fn test_format_decimal_rounds_non_midpoints_to_nearest() {
        // 1.115 is stored just below the midpoint, so it rounds down.
        assert_eq!(format_decimal(1.115), "1.11");
        assert_eq!(format_decimal(0.126), "0.13");
        assert_eq!(format_decimal(0.124), "0.12");
    }

    #[test]
    fn test_parse_decimal_reads_formatted_text() {
        // Arrange
        let text = format_decimal(100.20);

        // Act
        let parsed = parse_decimal(&text);

        // Assert
        assert_eq!(parsed, Some(100.20));
    }

    #[test]
    fn test_parse_decimal_accepts_grouped_text() {
        assert_eq!(parse_decimal("1,234.50"), Some(1234.5));
    }

    #[test]
    fn test_parse_decimal_reads_parenthesized_negative() {
        assert_eq!(parse_decimal("(42.50)"), Some(-42.5));
        assert_eq!(parse_decimal("(forty)"), None);
    }

    #[test]
    fn test_parse_decimal_rejects_non_finite_and_garbage() {
        assert_eq!(parse_decimal("NaN"), None);
        assert_eq!(parse_decimal("inf"), None);
        assert_eq!(parse_decimal("forty-two"), None);
    }

    // ── Date-times ────────────────────────────────────────────────────────────

    #[test]
    fn test_format_date_time_writes_seven_fraction_digits_and_offset() {
        let value = offset_date_time("2020-12-24T08:12:20+01:00");
        assert_eq!(format_date_time(&value), "2020-12-24T08:12:20.0000000+01:00");
    }

    #[test]
    fn test_format_date_time_keeps_sub_second_precision() {
        let value = offset_date_time("2021-03-04T05:06:07.1234567-05:30");
        assert_eq!(format_date_time(&value), "2021-03-04T05:06:07.1234567-05:30");
    }

    #[test]
    fn test_format_date_time_writes_utc_as_zero_offset() {
        let value = offset_date_time("2020-01-01T00:00:00Z");
        assert_eq!(format_date_time(&value), "2020-01-01T00:00:00.0000000+00:00");
    }

    #[test]
    fn test_parse_date_time_round_trips_formatted_text() {
        // Arrange
        let original = offset_date_time("2020-12-24T08:12:20.5+01:00");

        // Act
        let parsed = parse_date_time(&format_date_time(&original));

        // Assert
        assert_eq!(parsed, Some(original));
        assert_eq!(parsed.map(|v| *v.offset()), Some(*original.offset()));
    }

    #[test]
    fn test_parse_date_time_reads_offset_less_text_as_local_time() {
        let parsed = parse_date_time("2020-12-24T08:12:20").expect("parses");
        let expected = Local
            .with_ymd_and_hms(2020, 12, 24, 8, 12, 20)
            .earliest()
            .expect("valid local time");
        assert_eq!(parsed, expected);
    }

    #[test]
    fn test_parse_date_time_reads_space_separated_and_date_only_text() {
        assert!(parse_date_time("2020-12-24 08:12:20").is_some());
        assert!(parse_date_time("2020-12-24").is_some());
    }

    #[test]
    fn test_parse_date_time_rejects_garbage() {
        assert_eq!(parse_date_time("next tuesday"), None);
        assert_eq!(parse_date_time("2020-13-45T99:00:00"), None);
    }

    #[test]
    fn test_min_date_time_precedes_any_parsed_value() {
        let parsed = parse_date_time("0001-01-01T00:00:00Z").expect("parses");
        assert!(min_date_time() < parsed);
    }
}
