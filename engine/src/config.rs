//! Pipeline configuration.
//!
//! Read from a JSON file (`configs/configs.json` by default), checked against
//! the embedded JSON Schema in `schemas/pipeline-config.json`, then
//! deserialized with defaults for every missing key.
//!
//! The core never reads this type directly: the pipeline derives explicit
//! [`Rules`] and [`NameMatching`] values from it.
//!
//! # Example
//!
//! ```json
//! {
//!   "input_path": "data",
//!   "output_path": "output",
//!   "log_level": "info",
//!   "honorific_list": ["mr", "mrs", "dr", "jr"],
//!   "phone_min_digits": 10,
//!   "name_folding": [{ "type": "strip_punctuation" }],
//!   "name_similarity_threshold": 0.92
//! }
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::cleaners::name::DEFAULT_HONORIFICS;
use crate::cleaners::{NameRules, Operation, PhoneRules, Rules};
use crate::error::{ConfigError, ConfigResult};
use crate::relations::NameMatching;

/// Default location of the configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "configs/configs.json";

const CONFIG_SCHEMA: &str = include_str!("../schemas/pipeline-config.json");

const DEFAULT_INPUT_DIR: &str = "data";
const DEFAULT_OUTPUT_DIR: &str = "output";
const EMPLOYEES_FILE: &str = "employees.csv";
const SALES_FILE: &str = "sales.csv";
const CLEANED_EMPLOYEES_FILE: &str = "employees_cleaned.csv";
const CLEANED_SALES_FILE: &str = "sales_cleaned.csv";
const REPORT_FILE: &str = "report.json";

/// Pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory holding `employees.csv` and `sales.csv`.
    pub input_path: Option<PathBuf>,
    /// Directory receiving cleaned tables and the report.
    pub output_path: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_data_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sales_data_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleaned_employee_data_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleaned_sales_data_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_path: Option<PathBuf>,

    pub log_level: String,

    #[serde(alias = "honorifics")]
    pub honorific_list: Vec<String>,
    pub phone_min_digits: usize,
    pub phone_max_digits: usize,
    pub name_folding: Vec<Operation>,
    pub name_similarity_threshold: Option<f64>,
    /// Sales dated after this day are rejected.
    pub reference_date: Option<NaiveDate>,
    /// Treat a structurally broken dataset as empty instead of aborting.
    pub continue_on_structural_error: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let phone = PhoneRules::default();
        Self {
            input_path: Some(PathBuf::from(DEFAULT_INPUT_DIR)),
            output_path: Some(PathBuf::from(DEFAULT_OUTPUT_DIR)),
            employee_data_path: None,
            sales_data_path: None,
            cleaned_employee_data_path: None,
            cleaned_sales_data_path: None,
            report_path: None,
            log_level: "info".to_string(),
            honorific_list: DEFAULT_HONORIFICS.iter().map(|s| s.to_string()).collect(),
            phone_min_digits: phone.min_digits,
            phone_max_digits: phone.max_digits,
            name_folding: Vec::new(),
            name_similarity_threshold: None,
            reference_date: None,
            continue_on_structural_error: false,
        }
    }
}

impl PipelineConfig {
    /// Load and check a configuration file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    /// Parse and check configuration JSON.
    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        let value: Value = serde_json::from_str(content)?;
        validate_against_schema(&value)?;
        let config: Self = serde_json::from_value(value)?;
        config.check()?;
        Ok(config)
    }

    /// Rules that passed the schema but are still unusable together.
    fn check(&self) -> ConfigResult<()> {
        if self.phone_min_digits > self.phone_max_digits {
            return Err(ConfigError::InvalidValue {
                key: "phone_min_digits".to_string(),
                message: format!(
                    "{} is greater than phone_max_digits ({})",
                    self.phone_min_digits, self.phone_max_digits
                ),
            });
        }
        for op in &self.name_folding {
            if let Operation::Replace { pattern, .. } = op {
                if let Err(e) = regex::Regex::new(pattern) {
                    return Err(ConfigError::InvalidValue {
                        key: "name_folding".to_string(),
                        message: format!("invalid pattern '{pattern}': {e}"),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn rules(&self) -> Rules {
        Rules {
            name: NameRules {
                honorifics: self.honorific_list.clone(),
                folding: self.name_folding.clone(),
            },
            phone: PhoneRules {
                min_digits: self.phone_min_digits,
                max_digits: self.phone_max_digits,
            },
            reference_date: self.reference_date,
        }
    }

    pub fn name_matching(&self) -> NameMatching {
        NameMatching {
            similarity_threshold: self.name_similarity_threshold,
        }
    }

    fn input_dir(&self) -> PathBuf {
        self.input_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT_DIR))
    }

    fn output_dir(&self) -> PathBuf {
        self.output_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR))
    }

    pub fn employees_input(&self) -> PathBuf {
        self.employee_data_path
            .clone()
            .unwrap_or_else(|| self.input_dir().join(EMPLOYEES_FILE))
    }

    pub fn sales_input(&self) -> PathBuf {
        self.sales_data_path
            .clone()
            .unwrap_or_else(|| self.input_dir().join(SALES_FILE))
    }

    pub fn employees_output(&self) -> PathBuf {
        self.cleaned_employee_data_path
            .clone()
            .unwrap_or_else(|| self.output_dir().join(CLEANED_EMPLOYEES_FILE))
    }

    pub fn sales_output(&self) -> PathBuf {
        self.cleaned_sales_data_path
            .clone()
            .unwrap_or_else(|| self.output_dir().join(CLEANED_SALES_FILE))
    }

    pub fn report_output(&self) -> PathBuf {
        self.report_path
            .clone()
            .unwrap_or_else(|| self.output_dir().join(REPORT_FILE))
    }

    /// Pretty JSON of this configuration, suitable for `init-config`.
    pub fn to_json_pretty(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Validate a configuration value against the embedded schema.
fn validate_against_schema(value: &Value) -> ConfigResult<()> {
    let schema: Value = serde_json::from_str(CONFIG_SCHEMA)
        .map_err(|e| ConfigError::SchemaDefinition(e.to_string()))?;
    let validator = jsonschema::draft7::new(&schema)
        .map_err(|e| ConfigError::SchemaDefinition(e.to_string()))?;

    let errors: Vec<String> = validator
        .iter_errors(value)
        .map(|e| e.to_string())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::SchemaViolation { errors })
    }
}
