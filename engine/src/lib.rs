//! # Staffsales - employee and sales dataset cleaning
//!
//! Staffsales normalizes two related CSV datasets (an employee registry and a
//! sales ledger), validates every row against a typed contract and checks the
//! referential consistency between them.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  CSV Files  │────▶│   Parser    │────▶│  Cleaners + │────▶│  Relations  │
//! │  (ISO/UTF8) │     │  (auto-enc) │     │  Contracts  │     │  + Report   │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use staffsales::{run_pipeline, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = PipelineConfig::default();
//!     let outcome = run_pipeline(&config).await.unwrap();
//!     println!("{} valid employees", outcome.report.employees.valid);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types per stage
//! - [`models`] - Tables, records and domain entities
//! - [`parser`] - CSV loading with auto-detection, CSV writing
//! - [`cleaners`] - Field normalizers
//! - [`schema`] - Record contracts and row validation
//! - [`dataset`] - Whole-table cleaning and duplicate detection
//! - [`relations`] - Cross-dataset consistency checks
//! - [`report`] - Run report and terminal summary
//! - [`config`] - JSON configuration
//! - [`pipeline`] - End-to-end orchestration
//! - [`logs`] - Progress logging

// Core modules
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Cleaning and validation
pub mod cleaners;
pub mod dataset;
pub mod schema;

// Cross-dataset checks
pub mod relations;

// Output
pub mod report;

// Orchestration
pub mod config;
pub mod logs;
pub mod pipeline;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError, LoadError, PipelineError, PipelineResult, StructuralError, WriteError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    ContractType, Employee, EntityKind, FieldValue, PersonName, Record, Sale, SaleStatus, Table,
};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{
    decode_content, detect_delimiter, detect_encoding, load_table, parse_bytes_auto, parse_str,
    write_table, LoadedTable,
};

// =============================================================================
// Re-exports - Cleaning and validation
// =============================================================================

pub use cleaners::{clean_field, FieldKind, NameRules, Operation, PhoneRules, Rules};
pub use dataset::{clean_dataset, CleaningAnomaly, DatasetResult};
pub use schema::{
    validate_record, EmployeeContract, RecordContract, Rejection, RejectionReason,
    SaleContract,
};

// =============================================================================
// Re-exports - Relations
// =============================================================================

pub use relations::{NameMatching, RelationFinding, RelationStats, RelationsValidator};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use config::{PipelineConfig, DEFAULT_CONFIG_PATH};
pub use logs::{init_logging, log_error, log_info, log_success, log_warning};
pub use pipeline::{clean_file, process_tables, run_pipeline, ProcessedRun, RunOutcome};
pub use report::{DatasetSummary, RunReport};
