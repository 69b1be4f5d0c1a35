//! Phone normalization.

use serde::{Deserialize, Serialize};

use super::operations::Operation;

/// Accepted digit-count range for phone numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneRules {
    pub min_digits: usize,
    pub max_digits: usize,
}

impl Default for PhoneRules {
    fn default() -> Self {
        Self {
            min_digits: 10,
            max_digits: 15,
        }
    }
}

/// Where a digit count falls relative to [`PhoneRules`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigitCount {
    TooShort(usize),
    Valid,
    TooLong(usize),
}

impl PhoneRules {
    pub fn check(&self, digits: usize) -> DigitCount {
        if digits < self.min_digits {
            DigitCount::TooShort(digits)
        } else if digits > self.max_digits {
            DigitCount::TooLong(digits)
        } else {
            DigitCount::Valid
        }
    }
}

/// Result of cleaning one phone value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedPhone {
    /// Canonical `+?digits` when valid, otherwise the trimmed input.
    pub value: String,
    pub count: DigitCount,
}

/// Number of digits in a phone value.
pub fn digit_count(value: &str) -> usize {
    value.chars().filter(|c| c.is_ascii_digit()).count()
}

/// Clean a phone value: keep digits and a leading `+`.
///
/// Out-of-range values pass through trimmed so the schema can reject them
/// with the original text.
pub fn clean(raw: &str, rules: &PhoneRules) -> CleanedPhone {
    let trimmed = raw.trim();
    let digits = Operation::DigitsOnly.apply(trimmed);
    let count = rules.check(digits.len());
    let value = match count {
        DigitCount::Valid if has_country_marker(trimmed) => format!("+{}", digits),
        DigitCount::Valid => digits,
        _ => trimmed.to_string(),
    };
    CleanedPhone { value, count }
}

/// True when the number opens with `+`, possibly inside a parenthesis: `(+1) 555`.
fn has_country_marker(value: &str) -> bool {
    value
        .chars()
        .find(|c| !c.is_whitespace() && *c != '(')
        .is_some_and(|c| c == '+')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_strips_formatting() {
        let rules = PhoneRules::default();
        let cleaned = clean(" (555) 123-4567 ", &rules);
        assert_eq!(cleaned.value, "5551234567");
        assert_eq!(cleaned.count, DigitCount::Valid);
    }

    #[test]
    fn test_clean_keeps_country_code_marker() {
        let cleaned = clean("+33 6 12 34 56 78", &PhoneRules::default());
        assert_eq!(cleaned.value, "+33612345678");
    }

    #[test]
    fn test_country_code_marker_inside_parenthesis() {
        let rules = PhoneRules::default();
        let cleaned = clean("(+1) 555 010 2030", &rules);
        assert_eq!(cleaned.value, "+15550102030");
        assert_eq!(clean(&cleaned.value, &rules), cleaned);
        assert_eq!(clean("( 1) 555 010 2030", &rules).value, "15550102030");
    }

    #[test]
    fn test_leading_zeros_preserved() {
        let cleaned = clean("06.12.34.56.78", &PhoneRules::default());
        assert_eq!(cleaned.value, "0612345678");
    }

    #[test]
    fn test_out_of_range_passes_through() {
        let rules = PhoneRules::default();
        let short = clean(" 555-1234 ", &rules);
        assert_eq!(short.value, "555-1234");
        assert_eq!(short.count, DigitCount::TooShort(7));

        let long = clean("1234567890123456", &rules);
        assert_eq!(long.count, DigitCount::TooLong(16));
    }

    #[test]
    fn test_clean_is_idempotent() {
        let rules = PhoneRules::default();
        for raw in ["+1 (555) 123-4567", "555-1234", "0033 1 23 45 67 89", ""] {
            let once = clean(raw, &rules);
            assert_eq!(clean(&once.value, &rules), once);
        }
    }
}
