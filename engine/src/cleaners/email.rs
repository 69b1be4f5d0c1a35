//! Email normalization and format check.

use once_cell::sync::Lazy;
use regex::Regex;

use super::operations::{apply_all, Operation};

static EMAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap());

const EMAIL_OPERATIONS: [Operation; 3] = [
    Operation::Trim,
    Operation::Lowercase,
    Operation::CollapseWhitespace,
];

/// Normalize an email address. Missing input yields the empty string.
///
/// Never rejects: format problems are reported by the record schema.
pub fn clean(raw: Option<&str>) -> String {
    raw.map(|s| apply_all(&EMAIL_OPERATIONS, s)).unwrap_or_default()
}

/// `local@domain.tld` with exactly one `@` and an alphabetic TLD.
pub fn is_valid(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}
