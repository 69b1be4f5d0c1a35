//! Pipeline orchestration.
//!
//! Load → Clean → Validate → Instantiate → Relations → Write → Report.
//!
//! The two input files are loaded concurrently and the two cleaned tables are
//! written concurrently; everything in between is synchronous.
//!
//! # Example
//!
//! ```rust,ignore
//! use staffsales::{run_pipeline, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PipelineConfig::load("configs/configs.json")?;
//!     let outcome = run_pipeline(&config).await?;
//!     outcome.report.print_summary();
//!     Ok(())
//! }
//! ```

use std::path::{Path, PathBuf};

use crate::cleaners::Rules;
use crate::config::PipelineConfig;
use crate::dataset::{clean_dataset, DatasetResult};
use crate::error::{PipelineError, PipelineResult};
use crate::logs::{log_error, log_info, log_info_indent, log_success, log_success_indent, log_warning};
use crate::models::{EntityKind, Employee, Sale, Table};
use crate::parser::{load_table, write_table, LoadedTable};
use crate::relations::{RelationFinding, RelationStats, RelationsValidator};
use crate::report::{DatasetSummary, RunReport};
use crate::schema::{EmployeeContract, RecordContract, SaleContract};

/// Cleaned datasets and relation results of one run.
#[derive(Debug, Clone)]
pub struct ProcessedRun {
    pub employees: DatasetResult<Employee>,
    pub sales: DatasetResult<Sale>,
    pub relations: RelationStats,
    pub findings: Vec<RelationFinding>,
    /// Datasets skipped because of missing columns.
    pub errors: Vec<String>,
}

impl ProcessedRun {
    pub fn report(&self) -> RunReport {
        RunReport::new(
            DatasetSummary::from_result(&self.employees),
            DatasetSummary::from_result(&self.sales),
            self.relations.clone(),
            self.findings.clone(),
            self.errors.clone(),
        )
    }
}

/// Files written by [`run_pipeline`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    /// `None` when the dataset was skipped.
    pub employees: Option<PathBuf>,
    pub sales: Option<PathBuf>,
    pub report: PathBuf,
}

/// Result of [`run_pipeline`].
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub processed: ProcessedRun,
    pub report: RunReport,
    pub outputs: OutputPaths,
}

/// Load both inputs concurrently. Results are returned in (employees, sales) order.
pub async fn load_inputs(
    employees: PathBuf,
    sales: PathBuf,
) -> PipelineResult<(LoadedTable, LoadedTable)> {
    let employees_task = tokio::task::spawn_blocking(move || load_table(employees));
    let sales_task = tokio::task::spawn_blocking(move || load_table(sales));
    let (employees, sales) = tokio::try_join!(employees_task, sales_task)?;
    Ok((employees?, sales?))
}

/// Clean both tables and check their relations.
///
/// A dataset missing required columns aborts the run unless
/// `continue_on_structural_error` is set, in which case it is treated as
/// empty and the error is listed in [`ProcessedRun::errors`].
pub fn process_tables(
    employees: &Table,
    sales: &Table,
    config: &PipelineConfig,
) -> PipelineResult<ProcessedRun> {
    let rules = config.rules();
    let mut errors = Vec::new();

    log_info("Cleaning and validating datasets...");
    let employees = clean_or_skip::<EmployeeContract>(employees, &rules, config, &mut errors)?;
    let sales = clean_or_skip::<SaleContract>(sales, &rules, config, &mut errors)?;
    for summary in [employees.summary(), sales.summary()] {
        log_success_indent(summary, 1);
    }

    log_info("Checking relations...");
    let validator = RelationsValidator::new(&employees.valid, &sales.valid, config.name_matching());
    let relations = validator.summary();
    let findings = validator.findings();
    if relations.invalid_employee_ids_in_sales > 0 {
        log_warning(format!(
            "{} sale(s) reference an unknown employee",
            relations.invalid_employee_ids_in_sales
        ));
    }
    if relations.invalid_names_in_sales > 0 {
        log_warning(format!(
            "{} sale(s) have a mismatched seller name",
            relations.invalid_names_in_sales
        ));
    }
    log_success_indent(
        format!("{} employee(s) without sales", relations.employees_without_sales),
        1,
    );

    Ok(ProcessedRun {
        employees,
        sales,
        relations,
        findings,
        errors,
    })
}

fn clean_or_skip<C: RecordContract>(
    table: &Table,
    rules: &Rules,
    config: &PipelineConfig,
    errors: &mut Vec<String>,
) -> PipelineResult<DatasetResult<C::Instance>> {
    match clean_dataset::<C>(table, rules) {
        Ok(result) => Ok(result),
        Err(err) if config.continue_on_structural_error => {
            log_warning(format!("{err}; continuing with an empty {} dataset", C::ENTITY));
            errors.push(err.to_string());
            Ok(DatasetResult::empty(C::ENTITY))
        }
        Err(err) => {
            log_error(err.to_string());
            Err(err.into())
        }
    }
}

/// Run the whole pipeline described by `config`.
pub async fn run_pipeline(config: &PipelineConfig) -> PipelineResult<RunOutcome> {
    log_info("Reading input files...");
    let (employees, sales) = load_inputs(config.employees_input(), config.sales_input()).await?;
    for (kind, loaded) in [(EntityKind::Employee, &employees), (EntityKind::Sale, &sales)] {
        log_success_indent(
            format!(
                "{kind}: {} rows (encoding {}, separator '{}')",
                loaded.table.len(),
                loaded.encoding,
                format_delimiter(loaded.delimiter)
            ),
            1,
        );
    }

    let processed = process_tables(&employees.table, &sales.table, config)?;

    log_info("Writing cleaned tables...");
    let employees_output = written_path(&processed.employees, config.employees_output());
    let sales_output = written_path(&processed.sales, config.sales_output());
    write_tables(
        employees_output.clone().map(|p| (p, processed.employees.cleaned.clone())),
        sales_output.clone().map(|p| (p, processed.sales.cleaned.clone())),
    )
    .await?;
    for path in employees_output.iter().chain(sales_output.iter()) {
        log_info_indent(path.display().to_string(), 1);
    }

    let report = processed.report();
    let report_path = config.report_output();
    report.write_json(&report_path)?;
    log_success(format!("Report written to {}", report_path.display()));

    Ok(RunOutcome {
        processed,
        report,
        outputs: OutputPaths {
            employees: employees_output,
            sales: sales_output,
            report: report_path,
        },
    })
}

/// Output path for a dataset, `None` if it was skipped.
fn written_path<T>(result: &DatasetResult<T>, path: PathBuf) -> Option<PathBuf> {
    (!result.cleaned.headers.is_empty()).then_some(path)
}

async fn write_tables(
    employees: Option<(PathBuf, Table)>,
    sales: Option<(PathBuf, Table)>,
) -> PipelineResult<()> {
    let write = |job: Option<(PathBuf, Table)>| {
        tokio::task::spawn_blocking(move || match job {
            Some((path, table)) => write_table(path, &table),
            None => Ok(()),
        })
    };
    let (employees, sales) = tokio::try_join!(write(employees), write(sales))?;
    employees?;
    sales?;
    Ok(())
}

/// Load, clean and write a single dataset.
pub async fn clean_file(
    kind: EntityKind,
    input: &Path,
    output: &Path,
    rules: &Rules,
) -> PipelineResult<DatasetSummary> {
    let input = input.to_path_buf();
    let loaded = tokio::task::spawn_blocking(move || load_table(input)).await??;

    let (cleaned, summary) = match kind {
        EntityKind::Employee => {
            let result = clean_dataset::<EmployeeContract>(&loaded.table, rules)?;
            (result.cleaned.clone(), DatasetSummary::from_result(&result))
        }
        EntityKind::Sale => {
            let result = clean_dataset::<SaleContract>(&loaded.table, rules)?;
            (result.cleaned.clone(), DatasetSummary::from_result(&result))
        }
    };

    let output = output.to_path_buf();
    tokio::task::spawn_blocking(move || write_table(output, &cleaned))
        .await?
        .map_err(PipelineError::from)?;
    Ok(summary)
}

fn format_delimiter(delimiter: char) -> String {
    match delimiter {
        '\t' => "\\t".to_string(),
        other => other.to_string(),
    }
}
