//! Domain models for the staffsales pipeline.
//!
//! This module contains the data structures passed between stages:
//!
//! - [`FieldValue`] - Untyped cell value (text, number or empty)
//! - [`Record`] / [`Table`] - Raw and cleaned rows with their headers
//! - [`PersonName`] - Display and comparison forms of a name
//! - [`Employee`] / [`Sale`] - Validated, strongly-typed entities
//! - [`EntityKind`] - Which dataset a value belongs to

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// =============================================================================
// Entity Kind
// =============================================================================

/// The two datasets handled by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// Employee registry.
    Employee,
    /// Sales ledger.
    Sale,
}

impl EntityKind {
    /// Plural dataset name used in logs and reports.
    pub fn dataset_name(&self) -> &'static str {
        match self {
            Self::Employee => "employees",
            Self::Sale => "sales",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dataset_name())
    }
}

// =============================================================================
// Field Values
// =============================================================================

/// Markers read as a missing value, compared case-insensitively.
const NULL_MARKERS: [&str; 3] = ["nan", "null", "none"];

/// An untyped cell value as produced by the Load stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// No value.
    Empty,
    /// Numeric value (programmatic inputs; CSV cells arrive as text).
    Number(f64),
    /// Textual value, not yet normalized.
    Text(String),
}

impl FieldValue {
    /// Build a value from a raw CSV cell.
    ///
    /// Blank cells and null markers (`nan`, `null`, `none`) become [`FieldValue::Empty`].
    pub fn from_raw(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || NULL_MARKERS.iter().any(|m| trimmed.eq_ignore_ascii_case(m)) {
            FieldValue::Empty
        } else {
            FieldValue::Text(raw.to_string())
        }
    }

    /// True for `Empty` and for whitespace-only text.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Empty => true,
            FieldValue::Number(n) => n.is_nan(),
            FieldValue::Text(s) => s.trim().is_empty(),
        }
    }

    /// Textual form of the value, `None` when empty.
    pub fn as_text(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        match self {
            FieldValue::Empty => None,
            FieldValue::Number(n) => Some(format_number(*n)),
            FieldValue::Text(s) => Some(s.clone()),
        }
    }

    /// Cell content for CSV output.
    pub fn to_cell(&self) -> String {
        self.as_text().unwrap_or_default()
    }
}

/// Render integral numbers without a fractional part.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::from_raw(value)
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::from_raw(&value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Empty)
    }
}

// =============================================================================
// Records and Tables
// =============================================================================

/// One row: column name to value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    fields: HashMap<String, FieldValue>,
}

/// A row as read from the input.
pub type RawRecord = Record;

/// A row after field-level normalization. Same shape as [`RawRecord`].
pub type CleanedRecord = Record;

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from `(column, value)` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FieldValue>,
    {
        pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect()
    }

    /// Value of a column, if the column exists.
    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.fields.get(column)
    }

    /// Non-empty textual value of a column.
    pub fn text(&self, column: &str) -> Option<String> {
        self.fields.get(column).and_then(FieldValue::as_text)
    }

    /// Set a column value, replacing any previous one.
    pub fn insert(&mut self, column: impl Into<String>, value: FieldValue) {
        self.fields.insert(column.into(), value);
    }

    /// Remove a column and return its value.
    pub fn remove(&mut self, column: &str) -> Option<FieldValue> {
        self.fields.remove(column)
    }

    /// Iterate over column names (unordered).
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(String, FieldValue)> for Record {
    fn from_iter<T: IntoIterator<Item = (String, FieldValue)>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// Ordered headers plus rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    /// Column names in output order.
    pub headers: Vec<String>,
    /// Rows in source order.
    pub rows: Vec<Record>,
}

/// A table as read from the input.
pub type RawTable = Table;

/// A table after field-level normalization.
pub type CleanedTable = Table;

impl Table {
    /// Create an empty table with the given headers.
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Build a table from string rows aligned with `headers`.
    ///
    /// Missing trailing cells are read as empty.
    pub fn from_rows<H, R, C>(headers: H, rows: R) -> Self
    where
        H: IntoIterator,
        H::Item: Into<String>,
        R: IntoIterator,
        R::Item: IntoIterator<Item = C>,
        C: AsRef<str>,
    {
        let headers: Vec<String> = headers.into_iter().map(Into::into).collect();
        let mut table = Table::new(headers);
        for row in rows {
            let cells: Vec<C> = row.into_iter().collect();
            let record = table
                .headers
                .iter()
                .enumerate()
                .map(|(i, h)| {
                    let value = cells
                        .get(i)
                        .map(|c| FieldValue::from_raw(c.as_ref()))
                        .unwrap_or(FieldValue::Empty);
                    (h.clone(), value)
                })
                .collect();
            table.rows.push(record);
        }
        table
    }

    pub fn push(&mut self, record: Record) {
        self.rows.push(record);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell content of `column` in row `row`, empty string when absent.
    pub fn cell(&self, row: usize, column: &str) -> String {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(FieldValue::to_cell)
            .unwrap_or_default()
    }
}

// =============================================================================
// Person Name
// =============================================================================

/// A person's name in display and comparison forms.
///
/// `display` keeps the original casing and honorifics; `comparison` is the
/// normalized key used for matching.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PersonName {
    pub display: String,
    pub comparison: String,
}

impl fmt::Display for PersonName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

// =============================================================================
// Employee
// =============================================================================

/// Employment contract type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractType {
    #[serde(rename = "Full-time")]
    FullTime,
    #[serde(rename = "Part-time")]
    PartTime,
    Temporary,
    Freelance,
}

impl ContractType {
    /// Parse a label, ignoring case and the dash/space/underscore separator.
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized: String = label
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| !matches!(c, '-' | ' ' | '_'))
            .collect();
        match normalized.as_str() {
            "fulltime" => Some(Self::FullTime),
            "parttime" => Some(Self::PartTime),
            "temporary" => Some(Self::Temporary),
            "freelance" => Some(Self::Freelance),
            _ => None,
        }
    }

    /// Canonical label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::FullTime => "Full-time",
            Self::PartTime => "Part-time",
            Self::Temporary => "Temporary",
            Self::Freelance => "Freelance",
        }
    }
}

/// A validated employee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    /// Unique employee identifier.
    pub id: String,
    pub name: PersonName,
    /// Normalized email address.
    pub email: String,
    /// Canonical phone digits, optionally prefixed with `+`.
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birthdate: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hire_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub termination_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_type: Option<ContractType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary: Option<f64>,
}

impl Employee {
    /// Domain part of the email address.
    pub fn email_domain(&self) -> Option<&str> {
        self.email.split_once('@').map(|(_, domain)| domain)
    }
}

// =============================================================================
// Sale
// =============================================================================

/// Lifecycle status of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SaleStatus {
    Completed,
    Pending,
    Cancelled,
}

impl SaleStatus {
    /// Parse a status label (case-insensitive, "canceled" accepted).
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "completed" => Some(Self::Completed),
            "pending" => Some(Self::Pending),
            "cancelled" | "canceled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Completed => "Completed",
            Self::Pending => "Pending",
            Self::Cancelled => "Cancelled",
        }
    }
}

/// A validated sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    /// Unique sale identifier.
    pub id: String,
    /// Seller reference, expected to match an [`Employee::id`].
    pub employee_id: String,
    /// Seller name as recorded on the sale.
    pub employee_name: PersonName,
    /// Total amount of the sale.
    pub amount: f64,
    pub date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buyer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<SaleStatus>,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_value_null_markers() {
        assert_eq!(FieldValue::from_raw(""), FieldValue::Empty);
        assert_eq!(FieldValue::from_raw("   "), FieldValue::Empty);
        assert_eq!(FieldValue::from_raw("NaN"), FieldValue::Empty);
        assert_eq!(FieldValue::from_raw("null"), FieldValue::Empty);
        assert_eq!(
            FieldValue::from_raw(" Alice "),
            FieldValue::Text(" Alice ".to_string())
        );
    }

    #[test]
    fn test_number_as_text() {
        assert_eq!(FieldValue::Number(7.0).as_text(), Some("7".to_string()));
        assert_eq!(FieldValue::Number(12.5).as_text(), Some("12.5".to_string()));
        assert_eq!(FieldValue::Number(f64::NAN).as_text(), None);
        assert_eq!(FieldValue::Empty.to_cell(), "");
    }

    #[test]
    fn test_table_from_rows_pads_missing_cells() {
        let table = Table::from_rows(["id", "name", "email"], [vec!["E1", "Ann"]]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.cell(0, "name"), "Ann");
        assert_eq!(table.rows[0].get("email"), Some(&FieldValue::Empty));
    }

    #[test]
    fn test_record_text_skips_blank() {
        let record = Record::from_pairs([("id", "E1"), ("email", "  ")]);
        assert_eq!(record.text("id"), Some("E1".to_string()));
        assert_eq!(record.text("email"), None);
        assert_eq!(record.text("phone"), None);
    }

    #[test]
    fn test_contract_type_labels() {
        assert_eq!(ContractType::from_label("full-time"), Some(ContractType::FullTime));
        assert_eq!(ContractType::from_label("Part Time"), Some(ContractType::PartTime));
        assert_eq!(ContractType::from_label("intern"), None);
        assert_eq!(ContractType::FullTime.label(), "Full-time");
    }

    #[test]
    fn test_sale_status_accepts_us_spelling() {
        assert_eq!(SaleStatus::from_label("Canceled"), Some(SaleStatus::Cancelled));
        assert_eq!(SaleStatus::from_label(" PENDING "), Some(SaleStatus::Pending));
        assert_eq!(SaleStatus::from_label("refunded"), None);
    }

    #[test]
    fn test_employee_serialization_omits_missing_optionals() {
        let employee = Employee {
            id: "E1".into(),
            name: PersonName {
                display: "Ann Lee".into(),
                comparison: "ann lee".into(),
            },
            email: "ann@corp.com".into(),
            phone: "5551234567".into(),
            department: None,
            position: None,
            birthdate: None,
            hire_date: None,
            termination_date: None,
            contract_type: Some(ContractType::Freelance),
            salary: None,
        };
        let json = serde_json::to_string(&employee).unwrap();
        assert!(json.contains("\"Freelance\""));
        assert!(!json.contains("department"));
        assert_eq!(employee.email_domain(), Some("corp.com"));
    }
}
