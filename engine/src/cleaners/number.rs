//! Decimal and integer normalization.

use once_cell::sync::Lazy;
use regex::Regex;

const CURRENCY_SYMBOLS: [char; 3] = ['$', '€', '£'];

/// `1,234,567.89` or `1 234.5`: comma or space between groups of three digits.
static GROUPED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?\d{1,3}(?:[,\s]\d{3})+(?:\.\d+)?$").unwrap());

/// `12,50` or `1.234,56`: decimal comma with at most two decimals.
static DECIMAL_COMMA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?(?:\d{1,3}(?:[.\s]\d{3})+|\d+),\d{1,2}$").unwrap());

/// Strip currency symbols and separators, leaving text `f64::from_str` reads.
///
/// Commas and spaces are accepted only as thousands separators or as a
/// decimal comma; any other placement returns `None`.
fn strip_formatting(raw: &str) -> Option<String> {
    let trimmed = raw
        .trim()
        .trim_start_matches(CURRENCY_SYMBOLS)
        .trim_end_matches(CURRENCY_SYMBOLS)
        .trim();

    if !trimmed.contains(|c: char| c == ',' || c.is_whitespace()) {
        return Some(trimmed.to_string());
    }
    if GROUPED.is_match(trimmed) {
        return Some(
            trimmed
                .chars()
                .filter(|c| *c != ',' && !c.is_whitespace())
                .collect(),
        );
    }
    if DECIMAL_COMMA.is_match(trimmed) {
        return Some(
            trimmed
                .chars()
                .filter(|c| *c != '.' && !c.is_whitespace())
                .map(|c| if c == ',' { '.' } else { c })
                .collect(),
        );
    }
    None
}

/// Parse a decimal amount such as `$1,200.50` or `1.234,56 €`.
pub fn parse_decimal(raw: &str) -> Option<f64> {
    strip_formatting(raw)?
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
}

/// Parse an integer, accepting an all-zero fractional part (`3.0`).
pub fn parse_integer(raw: &str) -> Option<i64> {
    let stripped = strip_formatting(raw)?;
    stripped.parse::<i64>().ok().or_else(|| {
        stripped
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite() && n.fract() == 0.0 && n.abs() < 9.0e15)
            .map(|n| n as i64)
    })
}

/// Canonical decimal text, or `None` when unparseable.
pub fn clean_decimal(raw: &str) -> Option<String> {
    parse_decimal(raw)?;
    strip_formatting(raw)
}

/// Canonical integer text, or `None` when unparseable.
pub fn clean_integer(raw: &str) -> Option<String> {
    parse_integer(raw).map(|n| n.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_formatting_removed() {
        assert_eq!(parse_decimal("$1,200.50"), Some(1200.50));
        assert_eq!(parse_decimal(" 1 200 € "), Some(1200.0));
        assert_eq!(parse_decimal("-3.5"), Some(-3.5));
        assert_eq!(parse_decimal("abc"), None);
        assert_eq!(parse_decimal("inf"), None);
    }

    #[test]
    fn test_decimal_comma() {
        assert_eq!(parse_decimal("12,50"), Some(12.5));
        assert_eq!(parse_decimal("1.234,56"), Some(1234.56));
        assert_eq!(parse_decimal("1 234,5 €"), Some(1234.5));
        assert_eq!(clean_decimal("1.234,56").as_deref(), Some("1234.56"));
    }

    #[test]
    fn test_misplaced_separators_rejected() {
        assert_eq!(parse_decimal("1,2,3"), None);
        assert_eq!(parse_decimal("12 50"), None);
        assert_eq!(parse_decimal("1,23456"), None);
        assert_eq!(parse_integer("12,50"), None);
    }

    #[test]
    fn test_integer_accepts_zero_fraction() {
        assert_eq!(parse_integer("3"), Some(3));
        assert_eq!(parse_integer("3.0"), Some(3));
        assert_eq!(parse_integer("3.5"), None);
        assert_eq!(parse_integer("1,000"), Some(1000));
    }

    #[test]
    fn test_clean_is_idempotent() {
        let once = clean_decimal("£12,345.60").unwrap();
        assert_eq!(once, "12345.60");
        assert_eq!(clean_decimal(&once).unwrap(), once);

        let once = clean_integer("7.0").unwrap();
        assert_eq!(once, "7");
        assert_eq!(clean_integer(&once).unwrap(), once);
    }
}
