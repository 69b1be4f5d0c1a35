//! Record schemas.
//!
//! A [`RecordContract`] lists the columns an entity accepts and turns a
//! cleaned row into a typed instance. [`validate_record`] checks required
//! columns first, then lets the contract read and cross-check every field;
//! all problems of a row end up in a single [`Rejection`].

pub mod employee;
pub mod sale;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::cleaners::{self, email, number, FieldKind, NameRules, PhoneRules, Rules};
use crate::models::{CleanedRecord, EntityKind, PersonName};

pub use employee::EmployeeContract;
pub use sale::SaleContract;

// =============================================================================
// Contract Definition
// =============================================================================

/// One column accepted by a contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Canonical column name.
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    /// Other normalized header names accepted for this column.
    pub aliases: &'static [&'static str],
}

impl FieldSpec {
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: true,
            aliases: &[],
        }
    }

    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            aliases: &[],
        }
    }

    pub const fn aliases(self, aliases: &'static [&'static str]) -> Self {
        Self { aliases, ..self }
    }

    /// True when a normalized header names this field.
    pub fn matches(&self, header: &str) -> bool {
        self.name == header || self.aliases.contains(&header)
    }
}

/// A canonical column assembled from several source columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositeColumn {
    pub name: &'static str,
    pub parts: &'static [&'static str],
    pub separator: &'static str,
}

/// Schema of one entity.
pub trait RecordContract {
    /// Validated entity type.
    type Instance;

    const ENTITY: EntityKind;

    /// Canonical name of the unique identifier column.
    const ID_FIELD: &'static str = "id";

    fn fields() -> &'static [FieldSpec];

    fn composites() -> &'static [CompositeColumn] {
        &[]
    }

    /// Read every field and apply cross-field rules.
    ///
    /// Returns `None` when a required value is unusable; issues are recorded
    /// on the reader either way.
    fn build(reader: &mut RecordReader<'_>, rules: &Rules) -> Option<Self::Instance>;

    fn field(name: &str) -> Option<&'static FieldSpec> {
        Self::fields().iter().find(|f| f.name == name)
    }
}

/// Normalize a header: lower-case, with spaces, dashes and underscores unified.
pub fn normalize_header(header: &str) -> String {
    header
        .trim()
        .trim_start_matches('\u{feff}')
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

// =============================================================================
// Rejections
// =============================================================================

/// Why a field failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    MissingField,
    InvalidFormat,
    DuplicateId,
    InconsistentValue,
}

impl RejectionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingField => "missing_field",
            Self::InvalidFormat => "invalid_format",
            Self::DuplicateId => "duplicate_id",
            Self::InconsistentValue => "inconsistent_value",
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single validation problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldIssue {
    pub field: String,
    pub reason: RejectionReason,
    pub message: String,
}

impl FieldIssue {
    pub fn new(field: impl Into<String>, reason: RejectionReason, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason,
            message: message.into(),
        }
    }
}

/// A rejected row with every issue found on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    /// 0-based source row, set by the dataset cleaner.
    pub row: Option<usize>,
    pub record_id: Option<String>,
    pub issues: Vec<FieldIssue>,
}

impl Rejection {
    pub fn at_row(mut self, row: usize) -> Self {
        self.row = Some(row);
        self
    }

    pub fn has_reason(&self, reason: RejectionReason) -> bool {
        self.issues.iter().any(|i| i.reason == reason)
    }

    /// Distinct reasons in first-seen order.
    pub fn reasons(&self) -> Vec<RejectionReason> {
        let mut seen = Vec::new();
        for issue in &self.issues {
            if !seen.contains(&issue.reason) {
                seen.push(issue.reason);
            }
        }
        seen
    }
}

/// Result of validating one record.
pub type ValidationOutcome<T> = Result<T, Rejection>;

// =============================================================================
// Record Reader
// =============================================================================

/// Typed access to a cleaned record, collecting issues as it goes.
///
/// Blank values read as `None` without an issue; required-field presence is
/// checked separately by [`validate_record`].
#[derive(Debug)]
pub struct RecordReader<'a> {
    record: &'a CleanedRecord,
    issues: Vec<FieldIssue>,
    flagged: HashSet<String>,
}

impl<'a> RecordReader<'a> {
    pub fn new(record: &'a CleanedRecord) -> Self {
        Self {
            record,
            issues: Vec::new(),
            flagged: HashSet::new(),
        }
    }

    fn push(&mut self, field: &str, reason: RejectionReason, message: String) {
        self.flagged.insert(field.to_string());
        self.issues.push(FieldIssue::new(field, reason, message));
    }

    /// Record an `invalid_format` issue.
    pub fn invalid(&mut self, field: &str, message: impl Into<String>) {
        self.push(field, RejectionReason::InvalidFormat, message.into());
    }

    /// Record an `inconsistent_value` issue.
    pub fn inconsistent(&mut self, field: &str, message: impl Into<String>) {
        self.push(field, RejectionReason::InconsistentValue, message.into());
    }

    fn missing(&mut self, field: &str) {
        self.push(field, RejectionReason::MissingField, format!("'{field}' is required"));
    }

    /// True when the field already carries an issue.
    pub fn is_flagged(&self, field: &str) -> bool {
        self.flagged.contains(field)
    }

    pub fn text(&self, field: &str) -> Option<String> {
        self.record.text(field)
    }

    pub fn identifier(&self, field: &str) -> Option<String> {
        self.text(field).map(|s| cleaners::clean_identifier(&s))
    }

    pub fn email(&mut self, field: &str) -> Option<String> {
        let value = self.text(field)?;
        if email::is_valid(&value) {
            Some(value)
        } else {
            self.invalid(field, format!("'{value}' is not a valid email address"));
            None
        }
    }

    pub fn phone(&mut self, field: &str, rules: &PhoneRules) -> Option<String> {
        let value = self.text(field)?;
        match rules.check(cleaners::phone::digit_count(&value)) {
            cleaners::phone::DigitCount::Valid => Some(value),
            cleaners::phone::DigitCount::TooShort(n) => {
                self.invalid(
                    field,
                    format!("'{value}' has {n} digit(s), at least {} required", rules.min_digits),
                );
                None
            }
            cleaners::phone::DigitCount::TooLong(n) => {
                self.invalid(
                    field,
                    format!("'{value}' has {n} digit(s), at most {} allowed", rules.max_digits),
                );
                None
            }
        }
    }

    pub fn person_name(&self, field: &str, rules: &NameRules) -> Option<PersonName> {
        self.text(field).and_then(|s| cleaners::name::clean(&s, rules))
    }

    pub fn date(&mut self, field: &str) -> Option<NaiveDate> {
        let value = self.text(field)?;
        let parsed = cleaners::date::parse(&value);
        if parsed.is_none() {
            self.invalid(field, format!("'{value}' is not a valid date"));
        }
        parsed
    }

    /// Decimal with a sign rule: `> 0` when `strictly_positive`, `>= 0` otherwise.
    pub fn decimal(&mut self, field: &str, strictly_positive: bool) -> Option<f64> {
        let value = self.text(field)?;
        match number::parse_decimal(&value) {
            Some(n) if n > 0.0 || (!strictly_positive && n == 0.0) => Some(n),
            Some(_) => {
                let rule = if strictly_positive { "positive" } else { "non-negative" };
                self.invalid(field, format!("'{value}' must be {rule}"));
                None
            }
            None => {
                self.invalid(field, format!("'{value}' is not a number"));
                None
            }
        }
    }

    /// Strictly positive integer.
    pub fn positive_integer(&mut self, field: &str) -> Option<u32> {
        let value = self.text(field)?;
        match number::parse_integer(&value).map(u32::try_from) {
            Some(Ok(n)) if n > 0 => Some(n),
            Some(_) => {
                self.invalid(field, format!("'{value}' must be a positive integer"));
                None
            }
            None => {
                self.invalid(field, format!("'{value}' is not an integer"));
                None
            }
        }
    }

    /// Enumerated value parsed with `parse`; `allowed` is listed in the message.
    pub fn category<T>(
        &mut self,
        field: &str,
        parse: impl Fn(&str) -> Option<T>,
        allowed: &[&str],
    ) -> Option<T> {
        let value = self.text(field)?;
        let parsed = parse(&value);
        if parsed.is_none() {
            self.invalid(
                field,
                format!("'{value}' is not one of: {}", allowed.join(", ")),
            );
        }
        parsed
    }

    fn finish<T>(self, instance: Option<T>, record_id: Option<String>) -> ValidationOutcome<T> {
        match instance {
            Some(instance) if self.issues.is_empty() => Ok(instance),
            _ => Err(Rejection {
                row: None,
                record_id,
                issues: self.issues,
            }),
        }
    }
}

// =============================================================================
// Validation Entry Point
// =============================================================================

/// Validate one cleaned record against contract `C`.
///
/// ID uniqueness is not checked here; see [`crate::dataset::clean_dataset`].
pub fn validate_record<C: RecordContract>(
    record: &CleanedRecord,
    rules: &Rules,
) -> ValidationOutcome<C::Instance> {
    let mut reader = RecordReader::new(record);

    for spec in C::fields().iter().filter(|f| f.required) {
        if reader.text(spec.name).is_none() {
            reader.missing(spec.name);
        }
    }

    let instance = C::build(&mut reader, rules);
    let record_id = reader.identifier(C::ID_FIELD);
    reader.finish(instance, record_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Record;

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("Seller Employee ID"), "seller_employee_id");
        assert_eq!(normalize_header(" hire-date "), "hire_date");
        assert_eq!(normalize_header("\u{feff}Sale__ID"), "sale_id");
    }

    #[test]
    fn test_field_spec_matches_aliases() {
        let spec = FieldSpec::required("amount", FieldKind::Decimal).aliases(&["total_price"]);
        assert!(spec.matches("amount"));
        assert!(spec.matches("total_price"));
        assert!(!spec.matches("unit_price"));
    }

    #[test]
    fn test_rejection_reasons_deduplicated() {
        let rejection = Rejection {
            row: None,
            record_id: None,
            issues: vec![
                FieldIssue::new("a", RejectionReason::MissingField, "a"),
                FieldIssue::new("b", RejectionReason::InvalidFormat, "b"),
                FieldIssue::new("c", RejectionReason::MissingField, "c"),
            ],
        }
        .at_row(3);
        assert_eq!(rejection.row, Some(3));
        assert_eq!(
            rejection.reasons(),
            vec![RejectionReason::MissingField, RejectionReason::InvalidFormat]
        );
    }

    #[test]
    fn test_reader_sign_rules() {
        let record = Record::from_pairs([("a", "0"), ("b", "-1"), ("c", "x"), ("q", "2.0")]);
        let mut reader = RecordReader::new(&record);
        assert_eq!(reader.decimal("a", false), Some(0.0));
        assert_eq!(reader.decimal("a", true), None);
        assert_eq!(reader.decimal("b", false), None);
        assert_eq!(reader.decimal("c", false), None);
        assert_eq!(reader.decimal("missing", false), None);
        assert_eq!(reader.positive_integer("q"), Some(2));
        assert_eq!(reader.issues.len(), 3);
        assert!(reader.is_flagged("b"));
        assert!(!reader.is_flagged("missing"));
    }

    #[test]
    fn test_reason_serializes_snake_case() {
        let json = serde_json::to_string(&RejectionReason::DuplicateId).unwrap();
        assert_eq!(json, "\"duplicate_id\"");
    }
}
