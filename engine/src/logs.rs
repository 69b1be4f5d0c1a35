//! Pipeline progress logging.
//!
//! Progress messages go through `tracing` so the CLI filter (`log_level`,
//! overridden by `RUST_LOG`) applies to them like to every other event.

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Log level of a progress message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A single progress message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    /// Nesting depth, rendered as leading spaces
    #[serde(default)]
    pub indent: u8,
}

impl LogEntry {
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Info, message: message.into(), indent: 0 }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Success, message: message.into(), indent: 0 }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Warning, message: message.into(), indent: 0 }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Error, message: message.into(), indent: 0 }
    }

    pub fn with_indent(mut self, indent: u8) -> Self {
        self.indent = indent;
        self
    }

    /// Message with its level marker and indentation.
    pub fn render(&self) -> String {
        let marker = match self.level {
            LogLevel::Info => "",
            LogLevel::Success => "✓ ",
            LogLevel::Warning => "⚠ ",
            LogLevel::Error => "✗ ",
        };
        format!("{}{}{}", "   ".repeat(self.indent as usize), marker, self.message)
    }

    /// Emit as a `tracing` event.
    pub fn emit(&self) {
        let line = self.render();
        match self.level {
            LogLevel::Info | LogLevel::Success => info!(target: "staffsales::progress", "{line}"),
            LogLevel::Warning => warn!(target: "staffsales::progress", "{line}"),
            LogLevel::Error => error!(target: "staffsales::progress", "{line}"),
        }
    }
}

/// Convenient logging functions
pub fn log_info(msg: impl Into<String>) {
    LogEntry::info(msg).emit();
}

pub fn log_success(msg: impl Into<String>) {
    LogEntry::success(msg).emit();
}

pub fn log_warning(msg: impl Into<String>) {
    LogEntry::warning(msg).emit();
}

pub fn log_error(msg: impl Into<String>) {
    LogEntry::error(msg).emit();
}

pub fn log_info_indent(msg: impl Into<String>, indent: u8) {
    LogEntry::info(msg).with_indent(indent).emit();
}

pub fn log_success_indent(msg: impl Into<String>, indent: u8) {
    LogEntry::success(msg).with_indent(indent).emit();
}

/// Filter for `level`; `RUST_LOG` takes precedence when set.
pub fn build_env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match level.trim().to_lowercase().as_str() {
            "warning" => "warn".to_string(),
            other => other.to_string(),
        };
        EnvFilter::try_new(format!("warn,staffsales={level}"))
            .unwrap_or_else(|_| EnvFilter::new("warn,staffsales=info"))
    })
}

/// Install the global subscriber. Later calls are ignored.
pub fn init_logging(level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(build_env_filter(level))
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .try_init();
}
