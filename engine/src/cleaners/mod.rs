//! Field cleaners.
//!
//! Each cleaner turns one raw cell into its canonical form. Cleaners never
//! fail: a value they cannot normalize is passed through (trimmed) and an
//! [`AnomalyKind`] is reported so the record schema can reject it.
//!
//! Every cleaner is idempotent: `clean(clean(x)) == clean(x)`.

pub mod date;
pub mod email;
pub mod name;
pub mod number;
pub mod operations;
pub mod phone;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::FieldValue;
pub use name::NameRules;
pub use operations::Operation;
pub use phone::PhoneRules;

static INTEGRAL_FLOAT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(-?\d+)\.0+$").unwrap());

/// How a column is cleaned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Identifier,
    Email,
    Phone,
    PersonName,
    /// Free text.
    Text,
    Decimal,
    Integer,
    Date,
    /// Enumerated label; cleaned like text, checked by the schema.
    Category,
}

/// Cleaning and validation rules shared by every stage of the core.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rules {
    pub name: NameRules,
    pub phone: PhoneRules,
    /// Sales dated after this day are inconsistent.
    pub reference_date: Option<NaiveDate>,
}

/// Why a value could not be normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    PhoneTooShort,
    PhoneTooLong,
    UnparseableDate,
    UnparseableNumber,
}

impl AnomalyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PhoneTooShort => "phone_too_short",
            Self::PhoneTooLong => "phone_too_long",
            Self::UnparseableDate => "unparseable_date",
            Self::UnparseableNumber => "unparseable_number",
        }
    }
}

/// Output of [`clean_field`].
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedField {
    pub value: FieldValue,
    pub anomaly: Option<AnomalyKind>,
}

impl CleanedField {
    fn ok(value: FieldValue) -> Self {
        Self {
            value,
            anomaly: None,
        }
    }

    fn flagged(value: String, anomaly: AnomalyKind) -> Self {
        Self {
            value: FieldValue::Text(value),
            anomaly: Some(anomaly),
        }
    }
}

/// Clean one value according to its field kind.
pub fn clean_field(kind: FieldKind, value: &FieldValue, rules: &Rules) -> CleanedField {
    let Some(text) = value.as_text() else {
        return CleanedField::ok(FieldValue::Empty);
    };

    match kind {
        FieldKind::Identifier => CleanedField::ok(text_value(clean_identifier(&text))),
        FieldKind::Email => CleanedField::ok(text_value(email::clean(Some(&text)))),
        FieldKind::Phone => {
            let cleaned = phone::clean(&text, &rules.phone);
            match cleaned.count {
                phone::DigitCount::Valid => CleanedField::ok(text_value(cleaned.value)),
                phone::DigitCount::TooShort(_) => {
                    CleanedField::flagged(cleaned.value, AnomalyKind::PhoneTooShort)
                }
                phone::DigitCount::TooLong(_) => {
                    CleanedField::flagged(cleaned.value, AnomalyKind::PhoneTooLong)
                }
            }
        }
        FieldKind::PersonName => CleanedField::ok(text_value(name::clean_display(&text))),
        FieldKind::Text | FieldKind::Category => {
            CleanedField::ok(text_value(operations::collapse_whitespace(&text)))
        }
        FieldKind::Decimal => match number::clean_decimal(&text) {
            Some(clean) => CleanedField::ok(text_value(clean)),
            None => CleanedField::flagged(text.trim().to_string(), AnomalyKind::UnparseableNumber),
        },
        FieldKind::Integer => match number::clean_integer(&text) {
            Some(clean) => CleanedField::ok(text_value(clean)),
            None => CleanedField::flagged(text.trim().to_string(), AnomalyKind::UnparseableNumber),
        },
        FieldKind::Date => match date::clean(&text) {
            Some(clean) => CleanedField::ok(text_value(clean)),
            None => CleanedField::flagged(text.trim().to_string(), AnomalyKind::UnparseableDate),
        },
    }
}

/// Trim, collapse whitespace and drop an all-zero fractional part.
pub fn clean_identifier(raw: &str) -> String {
    let collapsed = operations::collapse_whitespace(raw);
    match INTEGRAL_FLOAT.captures(&collapsed) {
        Some(caps) => caps[1].to_string(),
        None => collapsed,
    }
}

fn text_value(text: String) -> FieldValue {
    if text.is_empty() {
        FieldValue::Empty
    } else {
        FieldValue::Text(text)
    }
}
