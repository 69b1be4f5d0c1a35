//! Run report.
//!
//! The report is the data a document renderer consumes: per-dataset totals,
//! rejections, anomalies, relation statistics and findings. It is written as
//! JSON and summarized on the terminal.

use chrono::{DateTime, Utc};
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use uuid::Uuid;

use crate::dataset::{CleaningAnomaly, DatasetResult};
use crate::error::{WriteError, WriteResult};
use crate::models::EntityKind;
use crate::parser::ensure_parent_dir;
use crate::relations::{RelationFinding, RelationStats};
use crate::schema::Rejection;

// =============================================================================
// Report Data
// =============================================================================

/// Totals and problems of one dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub dataset: EntityKind,
    pub total_rows: usize,
    pub valid: usize,
    pub rejected: usize,
    /// Percentage of valid rows.
    pub success_rate: f64,
    /// Rows per rejection reason; a row with several reasons counts once per reason.
    pub rejections_by_reason: BTreeMap<String, usize>,
    pub anomaly_count: usize,
    pub anomalies_by_kind: BTreeMap<String, usize>,
    pub rejections: Vec<Rejection>,
    pub anomalies: Vec<CleaningAnomaly>,
}

impl DatasetSummary {
    pub fn from_result<T>(result: &DatasetResult<T>) -> Self {
        let mut rejections_by_reason = BTreeMap::new();
        for rejection in &result.rejections {
            for reason in rejection.reasons() {
                *rejections_by_reason.entry(reason.to_string()).or_insert(0) += 1;
            }
        }
        let mut anomalies_by_kind = BTreeMap::new();
        for anomaly in &result.anomalies {
            *anomalies_by_kind.entry(anomaly.kind.as_str().to_string()).or_insert(0) += 1;
        }

        Self {
            dataset: result.kind,
            total_rows: result.total_rows,
            valid: result.valid.len(),
            rejected: result.rejections.len(),
            success_rate: (result.success_rate() * 100.0).round() / 100.0,
            rejections_by_reason,
            anomaly_count: result.anomalies.len(),
            anomalies_by_kind,
            rejections: result.rejections.clone(),
            anomalies: result.anomalies.clone(),
        }
    }
}

/// Everything a run produced, ready to be rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub employees: DatasetSummary,
    pub sales: DatasetSummary,
    pub relations: RelationStats,
    pub findings: Vec<RelationFinding>,
    /// Non-fatal errors, e.g. a dataset skipped for missing columns.
    pub errors: Vec<String>,
}

impl RunReport {
    pub fn new(
        employees: DatasetSummary,
        sales: DatasetSummary,
        relations: RelationStats,
        findings: Vec<RelationFinding>,
        errors: Vec<String>,
    ) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            employees,
            sales,
            relations,
            findings,
            errors,
        }
    }

    /// Write the report as pretty JSON, creating parent directories.
    pub fn write_json(&self, path: impl AsRef<Path>) -> WriteResult<()> {
        let path = path.as_ref();
        ensure_parent_dir(path)?;
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| WriteError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    /// Terminal tables for datasets and relations.
    pub fn render_summary(&self) -> String {
        format!(
            "{}\n{}",
            datasets_table(&[&self.employees, &self.sales]),
            relations_table(&self.relations)
        )
    }

    pub fn print_summary(&self) {
        println!("Run: {}", self.run_id);
        println!("{}", self.render_summary());
        for error in &self.errors {
            println!("! {error}");
        }
    }
}

// =============================================================================
// Terminal Rendering
// =============================================================================

/// Table of dataset totals.
pub fn datasets_table(summaries: &[&DatasetSummary]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Dataset"),
        header_cell("Rows"),
        header_cell("Valid"),
        header_cell("Rejected"),
        header_cell("Success %"),
        header_cell("Anomalies"),
    ]);
    apply_table_style(&mut table);
    for index in 1..=5 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    for summary in summaries {
        table.add_row(vec![
            Cell::new(summary.dataset).add_attribute(Attribute::Bold),
            Cell::new(summary.total_rows),
            Cell::new(summary.valid),
            count_cell(summary.rejected, Color::Red),
            Cell::new(format!("{:.2}", summary.success_rate)),
            count_cell(summary.anomaly_count, Color::Yellow),
        ]);
    }
    table
}

/// Table of relation statistics.
pub fn relations_table(stats: &RelationStats) -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Relation check"), header_cell("Count")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);

    let rows = [
        ("Employees with sales", stats.employees_with_sales, None),
        ("Employees without sales", stats.employees_without_sales, Some(Color::Yellow)),
        ("Sales with valid employee", stats.sales_with_valid_employee, None),
        ("Sales with unknown employee id", stats.invalid_employee_ids_in_sales, Some(Color::Red)),
        ("Sales with mismatched seller name", stats.invalid_names_in_sales, Some(Color::Red)),
        ("Sales before hire date", stats.sales_before_hire, Some(Color::Yellow)),
    ];
    for (label, count, color) in rows {
        let count = match color {
            Some(color) => count_cell(count, color),
            None => Cell::new(count),
        };
        table.add_row(vec![Cell::new(label), count]);
    }
    table
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        Cell::new(count).fg(Color::DarkGrey)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleaners::{AnomalyKind, Rules};
    use crate::dataset::clean_dataset;
    use crate::models::Table as DataTable;
    use crate::schema::EmployeeContract;
    use tempfile::tempdir;

    fn employee_result() -> DatasetResult<crate::models::Employee> {
        let table = DataTable::from_rows(
            ["id", "name", "email", "phone"],
            [
                vec!["E1", "Ann Lee", "ann@corp.com", "5551234567"],
                vec!["E2", "Bob Ray", "bob@corp", "12"],
                vec!["E2", "Bob Ray", "bob@corp.com", "5551234568"],
                vec!["E3", "", "cid@corp.com", "5551234569"],
            ],
        );
        clean_dataset::<EmployeeContract>(&table, &Rules::default()).unwrap()
    }

    #[test]
    fn test_summary_counts_reasons_per_row() {
        let summary = DatasetSummary::from_result(&employee_result());

        assert_eq!(summary.total_rows, 4);
        assert_eq!(summary.valid, 1);
        assert_eq!(summary.rejected, 3);
        assert_eq!(summary.success_rate, 25.0);
        assert_eq!(summary.rejections_by_reason["duplicate_id"], 2);
        assert_eq!(summary.rejections_by_reason["invalid_format"], 1);
        assert_eq!(summary.rejections_by_reason["missing_field"], 1);
        assert_eq!(summary.anomalies_by_kind[AnomalyKind::PhoneTooShort.as_str()], 1);
    }

    #[test]
    fn test_write_json_report() {
        let employees = DatasetSummary::from_result(&employee_result());
        let sales = DatasetSummary::from_result(&DatasetResult::<()>::empty(EntityKind::Sale));
        let report = RunReport::new(
            employees,
            sales,
            RelationStats::default(),
            vec![RelationFinding::OrphanEmployeeCount { count: 1 }],
            vec!["sales dataset skipped".to_string()],
        );

        let dir = tempdir().unwrap();
        let path = dir.path().join("reports/report.json");
        report.write_json(&path).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["employees"]["dataset"], "employee");
        assert_eq!(written["sales"]["total_rows"], 0);
        assert_eq!(written["findings"][0]["kind"], "orphan_employee_count");
        assert_eq!(written["run_id"], report.run_id.to_string());
    }

    #[test]
    fn test_render_summary_lists_datasets() {
        let employees = DatasetSummary::from_result(&employee_result());
        let sales = DatasetSummary::from_result(&DatasetResult::<()>::empty(EntityKind::Sale));
        let report = RunReport::new(employees, sales, RelationStats::default(), Vec::new(), Vec::new());

        let rendered = report.render_summary();
        assert!(rendered.contains("employees"));
        assert!(rendered.contains("sales"));
        assert!(rendered.contains("Sales before hire date"));
    }
}
