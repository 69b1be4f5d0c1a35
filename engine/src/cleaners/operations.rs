//! Text operations used to build field cleaners.
//!
//! Operations are also accepted from configuration (`name_folding`) as JSON
//! objects tagged by `type`, e.g. `{"type": "strip_punctuation"}`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// A single string-to-string normalization step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    /// Remove leading and trailing whitespace
    Trim,

    /// Convert to lowercase
    Lowercase,

    /// Convert to uppercase
    Uppercase,

    /// Replace every whitespace run with a single space
    CollapseWhitespace,

    /// Remove punctuation, keeping letters, digits and whitespace
    StripPunctuation,

    /// Keep letters, digits and whitespace only
    Alphanumeric,

    /// Keep ASCII digits only
    DigitsOnly,

    /// Replace using regex pattern
    Replace {
        pattern: String,
        #[serde(default)]
        value: String,
    },
}

impl Operation {
    /// Apply this operation to a string.
    pub fn apply(&self, value: &str) -> String {
        match self {
            Operation::Trim => value.trim().to_string(),
            Operation::Lowercase => value.to_lowercase(),
            Operation::Uppercase => value.to_uppercase(),
            Operation::CollapseWhitespace => collapse_whitespace(value),
            Operation::StripPunctuation => value
                .chars()
                .filter(|c| !c.is_ascii_punctuation() && !is_typographic_punctuation(*c))
                .collect(),
            Operation::Alphanumeric => value
                .chars()
                .filter(|c| c.is_alphanumeric() || c.is_whitespace())
                .collect(),
            Operation::DigitsOnly => value.chars().filter(|c| c.is_ascii_digit()).collect(),
            Operation::Replace {
                pattern,
                value: replacement,
            } => Regex::new(pattern)
                .map(|re| re.replace_all(value, replacement.as_str()).into_owned())
                .unwrap_or_else(|_| value.to_string()),
        }
    }
}

/// Apply a chain of operations left to right.
pub fn apply_all(operations: &[Operation], value: &str) -> String {
    operations
        .iter()
        .fold(value.to_string(), |acc, op| op.apply(&acc))
}

/// Trim and replace whitespace runs with a single space.
pub fn collapse_whitespace(value: &str) -> String {
    WHITESPACE_RUN.replace_all(value.trim(), " ").into_owned()
}

fn is_typographic_punctuation(c: char) -> bool {
    matches!(c, '\u{2018}' | '\u{2019}' | '\u{201C}' | '\u{201D}' | '\u{2013}' | '\u{2014}')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim() {
        assert_eq!(Operation::Trim.apply("  hello  "), "hello");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(
            Operation::CollapseWhitespace.apply("  Ann \t  Lee\n"),
            "Ann Lee"
        );
    }

    #[test]
    fn test_strip_punctuation() {
        assert_eq!(Operation::StripPunctuation.apply("o'brien-smith."), "obriensmith");
        assert_eq!(Operation::StripPunctuation.apply("o\u{2019}neil"), "oneil");
    }

    #[test]
    fn test_digits_only() {
        assert_eq!(Operation::DigitsOnly.apply("+1 (555) 123-4567"), "15551234567");
    }

    #[test]
    fn test_replace_with_invalid_pattern_is_noop() {
        let op = Operation::Replace {
            pattern: "(".to_string(),
            value: String::new(),
        };
        assert_eq!(op.apply("abc"), "abc");
    }

    #[test]
    fn test_chain_from_json() {
        let ops: Vec<Operation> = serde_json::from_str(
            r#"[{"type": "strip_punctuation"}, {"type": "collapse_whitespace"}]"#,
        )
        .unwrap();
        assert_eq!(apply_all(&ops, "jean - luc  picard"), "jean luc picard");
    }
}
