//! Compact validity strings such as `"90d"` or `"10y"`.
//!
//! Units are fixed lengths, not calendar arithmetic: a month is always 30
//! days and a year always 365 days.

use std::sync::OnceLock;

use regex::Regex;
use time::Duration;

use crate::error::{CertyError, Result};

const SECONDS_PER_HOUR: i64 = 60 * 60;
const SECONDS_PER_DAY: i64 = 24 * SECONDS_PER_HOUR;
const SECONDS_PER_WEEK: i64 = 7 * SECONDS_PER_DAY;
const SECONDS_PER_MONTH: i64 = 30 * SECONDS_PER_DAY;
const SECONDS_PER_YEAR: i64 = 365 * SECONDS_PER_DAY;

fn validity_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // ASCII classes only: `\d` and `\w` would also accept other scripts.
    RE.get_or_init(|| Regex::new(r"^([0-9]+)([0-9A-Za-z_]+)$").expect("validity regex is valid"))
}

/// Parses `<integer><unit>` into a duration.
///
/// Units: `h` hours, `d` days, `w` weeks, `m` 30-day months, `y` 365-day years.
///
/// ```
/// use certy::duration::parse_duration;
/// assert_eq!(parse_duration("2w").unwrap(), time::Duration::days(14));
/// ```
pub fn parse_duration(value: &str) -> Result<Duration> {
    let captures = validity_regex()
        .captures(value)
        .ok_or_else(|| CertyError::InvalidFormat(value.to_string()))?;

    let unit_seconds = match &captures[2] {
        "h" => SECONDS_PER_HOUR,
        "d" => SECONDS_PER_DAY,
        "w" => SECONDS_PER_WEEK,
        "m" => SECONDS_PER_MONTH,
        "y" => SECONDS_PER_YEAR,
        unit => return Err(CertyError::InvalidUnit(unit.to_string())),
    };

    let seconds = captures[1]
        .parse::<i64>()
        .ok()
        .and_then(|n| n.checked_mul(unit_seconds))
        .ok_or_else(|| CertyError::InvalidNumber(value.to_string()))?;

    Ok(Duration::seconds(seconds))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_units_have_fixed_lengths() {
        assert_eq!(parse_duration("12h").unwrap(), Duration::hours(12));
        assert_eq!(parse_duration("90d").unwrap(), Duration::days(90));
        assert_eq!(parse_duration("2w").unwrap(), Duration::hours(14 * 24));
        assert_eq!(parse_duration("1m").unwrap(), Duration::days(30));
        assert_eq!(parse_duration("3m").unwrap(), Duration::days(90));
        assert_eq!(parse_duration("1y").unwrap(), Duration::days(365));
        assert_eq!(parse_duration("10y").unwrap(), Duration::days(3650));
        assert_eq!(parse_duration("0d").unwrap(), Duration::ZERO);
    }

    #[test]
    fn test_invalid_format() {
        for value in ["", "d", "-1d", "30 d", "1.5y", "x30d", "\u{0661}\u{0662}d", "5\u{00e9}"] {
            assert!(
                matches!(parse_duration(value), Err(CertyError::InvalidFormat(_))),
                "{value:?} should be an invalid format"
            );
        }
    }

    #[test]
    fn test_invalid_unit() {
        for value in ["30", "30s", "1yr", "5D", "10dd"] {
            assert!(
                matches!(parse_duration(value), Err(CertyError::InvalidUnit(_))),
                "{value:?} should have an invalid unit"
            );
        }
    }

    #[test]
    fn test_invalid_number() {
        assert!(matches!(
            parse_duration("99999999999999999999d"),
            Err(CertyError::InvalidNumber(_))
        ));
        assert!(matches!(
            parse_duration("9223372036854775807y"),
            Err(CertyError::InvalidNumber(_))
        ));
    }
}
