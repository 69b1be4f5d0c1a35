//! Staffsales CLI - clean and cross-check employee and sales datasets
//!
//! # Main Commands
//!
//! ```bash
//! staffsales run                          # Full pipeline from configs/configs.json
//! staffsales run --config other.json      # Full pipeline from another config
//! staffsales clean employees raw.csv      # Clean a single dataset
//! staffsales relations                    # Print relation checks only
//! staffsales init-config                  # Write a default configuration
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use staffsales::config::DEFAULT_CONFIG_PATH;
use staffsales::pipeline::load_inputs;
use staffsales::report::{datasets_table, relations_table};
use staffsales::{
    clean_file, init_logging, process_tables, run_pipeline, EntityKind, PipelineConfig,
    RelationFinding,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "staffsales")]
#[command(about = "Clean, validate and cross-check employee and sales CSV datasets", long_about = None)]
struct Cli {
    /// Log level (overrides the configuration; RUST_LOG overrides both)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the whole pipeline: load, clean, validate, check relations, report
    Run {
        /// Configuration file
        #[arg(short, long, env = "STAFFSALES_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Clean and validate a single dataset
    Clean {
        /// Which contract to apply
        #[arg(value_enum)]
        dataset: DatasetArg,

        /// Input CSV file
        input: PathBuf,

        /// Output file (default: <input>_cleaned.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Configuration file providing the cleaning rules
        #[arg(short, long, env = "STAFFSALES_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Check relations between employees and sales without writing anything
    Relations {
        /// Configuration file
        #[arg(short, long, env = "STAFFSALES_CONFIG")]
        config: Option<PathBuf>,

        /// Employees CSV (default: from configuration)
        #[arg(long)]
        employees: Option<PathBuf>,

        /// Sales CSV (default: from configuration)
        #[arg(long)]
        sales: Option<PathBuf>,

        /// Print every finding as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write the default configuration
    InitConfig {
        /// Output file
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum DatasetArg {
    Employees,
    Sales,
}

impl From<DatasetArg> for EntityKind {
    fn from(arg: DatasetArg) -> Self {
        match arg {
            DatasetArg::Employees => EntityKind::Employee,
            DatasetArg::Sales => EntityKind::Sale,
        }
    }
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let log_level = cli.log_level.as_deref();

    let result = match cli.command {
        Commands::Run { config } => cmd_run(config.as_deref(), log_level).await,
        Commands::Clean {
            dataset,
            input,
            output,
            config,
        } => cmd_clean(dataset.into(), &input, output.as_deref(), config.as_deref(), log_level).await,
        Commands::Relations {
            config,
            employees,
            sales,
            json,
        } => cmd_relations(config.as_deref(), employees, sales, json, log_level).await,
        Commands::InitConfig { output, force } => cmd_init_config(&output, force),
    };

    if let Err(e) = result {
        eprintln!("✗ Error: {}", e);
        std::process::exit(1);
    }
}

/// Load the given configuration, or the default file if present, or defaults.
fn load_config(
    path: Option<&Path>,
    log_level: Option<&str>,
) -> Result<PipelineConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => PipelineConfig::load(path)?,
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => PipelineConfig::load(DEFAULT_CONFIG_PATH)?,
        None => PipelineConfig::default(),
    };
    init_logging(log_level.unwrap_or(&config.log_level));
    Ok(config)
}

async fn cmd_run(
    config_path: Option<&Path>,
    log_level: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path, log_level)?;

    let outcome = run_pipeline(&config).await?;
    outcome.report.print_summary();

    if let Some(path) = &outcome.outputs.employees {
        eprintln!("   Employees: {}", path.display());
    }
    if let Some(path) = &outcome.outputs.sales {
        eprintln!("   Sales: {}", path.display());
    }
    eprintln!("   Report: {}", outcome.outputs.report.display());
    Ok(())
}

async fn cmd_clean(
    kind: EntityKind,
    input: &Path,
    output: Option<&Path>,
    config_path: Option<&Path>,
    log_level: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path, log_level)?;
    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_clean_output(input));

    eprintln!("Cleaning {}: {}", kind, input.display());
    let summary = clean_file(kind, input, &output, &config.rules()).await?;

    println!("{}", datasets_table(&[&summary]));
    for rejection in summary.rejections.iter().take(10) {
        let row = rejection.row.map(|r| r.to_string()).unwrap_or_else(|| "?".to_string());
        for issue in &rejection.issues {
            eprintln!("   row {}: {} ({})", row, issue.message, issue.reason);
        }
    }
    if summary.rejections.len() > 10 {
        eprintln!("   ... {} more rejected rows", summary.rejections.len() - 10);
    }
    eprintln!("   Saved to: {}", output.display());
    Ok(())
}

fn default_clean_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "dataset".to_string());
    input.with_file_name(format!("{stem}_cleaned.csv"))
}

async fn cmd_relations(
    config_path: Option<&Path>,
    employees: Option<PathBuf>,
    sales: Option<PathBuf>,
    json: bool,
    log_level: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path, log_level)?;
    let employees = employees.unwrap_or_else(|| config.employees_input());
    let sales = sales.unwrap_or_else(|| config.sales_input());

    let (employees, sales) = load_inputs(employees, sales).await?;
    let processed = process_tables(&employees.table, &sales.table, &config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&processed.findings)?);
        return Ok(());
    }

    println!("{}", relations_table(&processed.relations));
    for finding in &processed.findings {
        match finding {
            RelationFinding::UnknownEmployeeId { sale_id, employee_id } => {
                eprintln!("   sale {sale_id}: unknown employee {employee_id}");
            }
            RelationFinding::NameMismatch {
                sale_id,
                sale_name,
                employee_name,
                ..
            } => {
                eprintln!("   sale {sale_id}: seller '{sale_name}' is not '{employee_name}'");
            }
            RelationFinding::SaleBeforeHire {
                sale_id,
                sale_date,
                hire_date,
                ..
            } => {
                eprintln!("   sale {sale_id}: dated {sale_date}, seller hired {hire_date}");
            }
            RelationFinding::EmployeeWithoutSales { .. } | RelationFinding::OrphanEmployeeCount { .. } => {}
        }
    }
    Ok(())
}

fn cmd_init_config(output: &Path, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    if output.exists() && !force {
        return Err(format!("{} already exists (use --force to overwrite)", output.display()).into());
    }
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(output, PipelineConfig::default().to_json_pretty()?)?;
    eprintln!("✓ Configuration written to {}", output.display());
    Ok(())
}
