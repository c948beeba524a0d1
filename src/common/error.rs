//! Error types for the regression runner
//!
//! Only run-level problems live here: unreadable suites, bad configuration,
//! an unwritable report. Individual check failures never become an `Error`;
//! they are carried by [`crate::testing::CheckError`] and folded into the report.

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the regression runner
#[derive(Error, Debug)]
pub enum Error {
    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    #[error("Unknown test class '{0}'. Use 'ott classes' to list the available classes")]
    UnknownClass(String),

    // === Dependency Errors ===
    #[error("Row marker '{marker}' names test class '{class}', which does not exist")]
    DependencyClassNotFound { marker: String, class: String },

    #[error("Row marker '{marker}' names check '{check}', which class {class} does not declare")]
    DependencyCheckNotFound {
        marker: String,
        class: String,
        check: String,
    },

    // === Transport Errors ===
    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("Request to {url} timed out after {secs} seconds")]
    Timeout { url: String, secs: u64 },

    // === Suite Source Errors ===
    #[error("Failed to read suite file '{path}': {error}")]
    SuiteRead { path: String, error: String },

    // === IO Errors ===
    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    #[error("Failed to write report '{path}': {error}")]
    ReportWrite { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Internal Errors ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a transport error for a request URL
    pub fn transport(url: &str, message: impl ToString) -> Self {
        Self::Transport {
            url: url.to_string(),
            message: message.to_string(),
        }
    }

    /// Create a suite read error for a CSV file
    pub fn suite_read(path: &std::path::Path, error: impl ToString) -> Self {
        Self::SuiteRead {
            path: path.display().to_string(),
            error: error.to_string(),
        }
    }

    /// Whether this error belongs to a single row rather than the whole run
    pub fn is_row_local(&self) -> bool {
        matches!(
            self,
            Error::DependencyClassNotFound { .. } | Error::DependencyCheckNotFound { .. }
        )
    }
}
