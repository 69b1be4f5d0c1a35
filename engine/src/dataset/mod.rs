//! Dataset cleaning.
//!
//! [`clean_dataset`] applies a [`RecordContract`] to a whole table: headers
//! are resolved to canonical names, every known column is cleaned, every row
//! is validated, and rows sharing an id are rejected as duplicates.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

use crate::cleaners::{self, AnomalyKind, FieldKind, Rules};
use crate::error::StructuralError;
use crate::models::{CleanedTable, EntityKind, FieldValue, RawTable, Record};
use crate::schema::{
    normalize_header, validate_record, FieldIssue, RecordContract, Rejection, RejectionReason,
    ValidationOutcome,
};

// =============================================================================
// Results
// =============================================================================

/// A value a cleaner could not normalize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningAnomaly {
    /// 0-based source row.
    pub row: usize,
    pub field: String,
    pub value: String,
    pub kind: AnomalyKind,
}

/// Output of [`clean_dataset`].
#[derive(Debug, Clone)]
pub struct DatasetResult<T> {
    pub kind: EntityKind,
    /// Cleaned rows with canonical headers, one per input row.
    pub cleaned: CleanedTable,
    /// Valid instances in input order.
    pub valid: Vec<T>,
    /// Rejections sorted by row.
    pub rejections: Vec<Rejection>,
    /// Anomalies sorted by row.
    pub anomalies: Vec<CleaningAnomaly>,
    pub total_rows: usize,
}

impl<T> DatasetResult<T> {
    /// Result for a dataset with no rows.
    pub fn empty(kind: EntityKind) -> Self {
        Self {
            kind,
            cleaned: CleanedTable::default(),
            valid: Vec::new(),
            rejections: Vec::new(),
            anomalies: Vec::new(),
            total_rows: 0,
        }
    }

    /// Split into `(valid, rejections)`.
    pub fn into_parts(self) -> (Vec<T>, Vec<Rejection>) {
        (self.valid, self.rejections)
    }

    /// Share of valid rows, in percent. An empty dataset scores 100.
    pub fn success_rate(&self) -> f64 {
        if self.total_rows == 0 {
            100.0
        } else {
            self.valid.len() as f64 * 100.0 / self.total_rows as f64
        }
    }

    /// Get summary statistics
    pub fn summary(&self) -> String {
        format!(
            "{}: {} rows, {} valid, {} rejected, {} anomalies",
            self.kind,
            self.total_rows,
            self.valid.len(),
            self.rejections.len(),
            self.anomalies.len()
        )
    }
}

// =============================================================================
// Column Resolution
// =============================================================================

/// Where an output column takes its value from.
#[derive(Debug, Clone, PartialEq)]
enum ColumnSource {
    /// A known field read from one source header.
    Field { header: String, kind: FieldKind },
    /// A known field assembled from several source headers.
    Composite {
        headers: Vec<String>,
        separator: &'static str,
        kind: FieldKind,
    },
    /// An unknown column, copied untouched.
    Passthrough { header: String },
}

#[derive(Debug, Clone)]
struct ResolvedColumns {
    /// Output column name and its source, in output order.
    columns: Vec<(String, ColumnSource)>,
}

fn resolve_columns<C: RecordContract>(headers: &[String]) -> Result<ResolvedColumns, StructuralError> {
    let mut columns: Vec<(String, ColumnSource)> = Vec::new();
    let mut claimed: Vec<&'static str> = Vec::new();
    let normalized: Vec<String> = headers.iter().map(|h| normalize_header(h)).collect();

    for (header, norm) in headers.iter().zip(&normalized) {
        let spec = C::fields()
            .iter()
            .find(|spec| spec.matches(norm) && !claimed.contains(&spec.name));
        match spec {
            Some(spec) => {
                claimed.push(spec.name);
                columns.push((
                    spec.name.to_string(),
                    ColumnSource::Field {
                        header: header.clone(),
                        kind: spec.kind,
                    },
                ));
            }
            None => columns.push((
                header.clone(),
                ColumnSource::Passthrough {
                    header: header.clone(),
                },
            )),
        }
    }

    for composite in C::composites() {
        if claimed.contains(&composite.name) {
            continue;
        }
        let parts: Vec<(usize, String)> = composite
            .parts
            .iter()
            .filter_map(|part| {
                normalized
                    .iter()
                    .position(|n| n.as_str() == *part)
                    .map(|i| (i, headers[i].clone()))
            })
            .collect();
        let Some(&(first, _)) = parts.first() else {
            continue;
        };
        let Some(spec) = C::field(composite.name) else {
            continue;
        };
        claimed.push(spec.name);
        let at = columns
            .iter()
            .position(|(_, source)| {
                matches!(source, ColumnSource::Passthrough { header } if *header == headers[first])
            })
            .unwrap_or(columns.len());
        columns.insert(
            at,
            (
                spec.name.to_string(),
                ColumnSource::Composite {
                    headers: parts.into_iter().map(|(_, h)| h).collect(),
                    separator: composite.separator,
                    kind: spec.kind,
                },
            ),
        );
    }

    rename_colliding_passthrough(&mut columns);

    let missing_columns: Vec<String> = C::fields()
        .iter()
        .filter(|spec| spec.required && !claimed.contains(&spec.name))
        .map(|spec| spec.name.to_string())
        .collect();
    if !missing_columns.is_empty() {
        return Err(StructuralError {
            dataset: C::ENTITY,
            missing_columns,
        });
    }

    Ok(ResolvedColumns { columns })
}

/// Give pass-through columns an output name no other column uses.
///
/// Canonical columns keep their names; a colliding pass-through header gets
/// the first free `_2`, `_3`, ... suffix.
fn rename_colliding_passthrough(columns: &mut [(String, ColumnSource)]) {
    let mut used: HashSet<String> = columns
        .iter()
        .filter(|(_, source)| !matches!(source, ColumnSource::Passthrough { .. }))
        .map(|(name, _)| name.clone())
        .collect();

    for (name, source) in columns.iter_mut() {
        if !matches!(source, ColumnSource::Passthrough { .. }) {
            continue;
        }
        if used.contains(name.as_str()) {
            let mut suffix = 2;
            while used.contains(&format!("{name}_{suffix}")) {
                suffix += 1;
            }
            *name = format!("{name}_{suffix}");
        }
        used.insert(name.clone());
    }
}

// =============================================================================
// Cleaning
// =============================================================================

/// Clean and validate every row of `table` against contract `C`.
///
/// Fails only when a required column is absent. Zero valid rows is a valid
/// result.
pub fn clean_dataset<C: RecordContract>(
    table: &RawTable,
    rules: &Rules,
) -> Result<DatasetResult<C::Instance>, StructuralError> {
    let dataset = C::ENTITY;
    let resolved = resolve_columns::<C>(&table.headers)?;
    debug!(
        dataset = %dataset,
        rows = table.len(),
        columns = resolved.columns.len(),
        "cleaning dataset"
    );

    let headers: Vec<String> = resolved.columns.iter().map(|(name, _)| name.clone()).collect();
    let mut cleaned = CleanedTable::new(headers);
    let mut anomalies = Vec::new();
    let mut outcomes: Vec<ValidationOutcome<C::Instance>> = Vec::with_capacity(table.len());

    for (row, raw) in table.rows.iter().enumerate() {
        let mut record = Record::new();
        for (name, source) in &resolved.columns {
            let value = match source {
                ColumnSource::Passthrough { header } => {
                    raw.get(header).cloned().unwrap_or(FieldValue::Empty)
                }
                ColumnSource::Field { header, kind } => {
                    let value = raw.get(header).cloned().unwrap_or(FieldValue::Empty);
                    clean_cell(*kind, &value, row, name, rules, &mut anomalies)
                }
                ColumnSource::Composite {
                    headers,
                    separator,
                    kind,
                } => {
                    let joined = headers
                        .iter()
                        .filter_map(|h| raw.text(h))
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect::<Vec<_>>()
                        .join(*separator);
                    clean_cell(*kind, &FieldValue::from_raw(&joined), row, name, rules, &mut anomalies)
                }
            };
            record.insert(name.clone(), value);
        }

        let outcome = validate_record::<C>(&record, rules).map_err(|r| r.at_row(row));
        outcomes.push(outcome);
        cleaned.push(record);
    }

    flag_duplicates::<C>(&cleaned, &mut outcomes);

    let total_rows = outcomes.len();
    let mut valid = Vec::new();
    let mut rejections = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(instance) => valid.push(instance),
            Err(rejection) => rejections.push(rejection),
        }
    }

    let result = DatasetResult {
        kind: C::ENTITY,
        cleaned,
        valid,
        rejections,
        anomalies,
        total_rows,
    };
    info!(dataset = %dataset, "{}", result.summary());
    Ok(result)
}

fn clean_cell(
    kind: FieldKind,
    value: &FieldValue,
    row: usize,
    field: &str,
    rules: &Rules,
    anomalies: &mut Vec<CleaningAnomaly>,
) -> FieldValue {
    let cleaned = cleaners::clean_field(kind, value, rules);
    if let Some(kind) = cleaned.anomaly {
        anomalies.push(CleaningAnomaly {
            row,
            field: field.to_string(),
            value: cleaned.value.to_cell(),
            kind,
        });
    }
    cleaned.value
}

/// Reject every row whose id is shared with another row.
///
/// Rows already rejected for other reasons still count as occurrences.
fn flag_duplicates<C: RecordContract>(
    cleaned: &CleanedTable,
    outcomes: &mut [ValidationOutcome<C::Instance>],
) {
    let mut rows_by_id: HashMap<String, Vec<usize>> = HashMap::new();
    for (row, record) in cleaned.rows.iter().enumerate() {
        if let Some(id) = record.text(C::ID_FIELD) {
            rows_by_id.entry(id).or_default().push(row);
        }
    }

    let mut duplicates: Vec<(String, Vec<usize>)> = rows_by_id
        .into_iter()
        .filter(|(_, rows)| rows.len() > 1)
        .collect();
    duplicates.sort_by_key(|(_, rows)| rows[0]);

    let dataset = C::ENTITY;
    for (id, rows) in duplicates {
        debug!(dataset = %dataset, id = %id, count = rows.len(), "duplicate id");
        let listed = rows.iter().map(usize::to_string).collect::<Vec<_>>().join(", ");
        for &row in &rows {
            let issue = FieldIssue::new(
                C::ID_FIELD,
                RejectionReason::DuplicateId,
                format!("id '{id}' appears in rows {listed}"),
            );
            match &mut outcomes[row] {
                Err(rejection) => rejection.issues.push(issue),
                slot @ Ok(_) => {
                    *slot = Err(Rejection {
                        row: Some(row),
                        record_id: Some(id.clone()),
                        issues: vec![issue],
                    });
                }
            }
        }
    }
}
