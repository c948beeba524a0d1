//! Configuration file handling
//!
//! Settings are layered: built-in defaults, then `config.toml`, then
//! environment variables. Command-line flags are applied last by the CLI.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::paths::config_path;
use super::Result;

/// Main configuration structure
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Remote service endpoints
    #[serde(default)]
    pub server: ServerConfig,

    /// Suite and report locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// Timeout settings
    #[serde(default)]
    pub timeouts: Timeouts,

    /// Class filters applied before any row runs
    #[serde(default)]
    pub filters: FilterConfig,
}

/// Remote service endpoints
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Base URL of the trip planner REST endpoint
    #[serde(default = "default_otp_url")]
    pub otp_url: String,

    /// Map front-end URL, carried into the report for linking
    #[serde(default = "default_map_url")]
    pub map_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            otp_url: default_otp_url(),
            map_url: default_map_url(),
        }
    }
}

fn default_otp_url() -> String {
    "http://localhost:8080/otp/".to_string()
}

fn default_map_url() -> String {
    "http://localhost:8080/index.html".to_string()
}

/// Suite and report locations
#[derive(Debug, Deserialize, Clone)]
pub struct PathsConfig {
    /// Directory holding one sub-directory of CSV files per test class
    #[serde(default = "default_csv_path")]
    pub csv_path: PathBuf,

    /// Where the JSON report is written
    #[serde(default = "default_report_path")]
    pub report_path: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            csv_path: default_csv_path(),
            report_path: default_report_path(),
        }
    }
}

fn default_csv_path() -> PathBuf {
    PathBuf::from("./suites/")
}

fn default_report_path() -> PathBuf {
    PathBuf::from("./report/otp_report.json")
}

/// Timeout settings in seconds
#[derive(Debug, Deserialize, Clone)]
pub struct Timeouts {
    /// Upper bound on a single request to the service
    #[serde(default = "default_request")]
    pub request_secs: u64,

    /// Slowest response a check still accepts
    #[serde(default = "default_max_response")]
    pub max_response_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            request_secs: default_request(),
            max_response_secs: default_max_response(),
        }
    }
}

fn default_request() -> u64 {
    45
}
fn default_max_response() -> u64 {
    30
}

/// Class filters
#[derive(Debug, Deserialize, Default, Clone)]
pub struct FilterConfig {
    /// Classes whose suites are never built
    #[serde(default)]
    pub skip: Vec<String>,

    /// When non-empty, every class not listed here is skipped
    #[serde(default)]
    pub only: Vec<String>,
}

impl Config {
    /// Load configuration from an explicit file, or the default config file
    ///
    /// Returns default configuration if no file exists. Environment
    /// overrides are applied on top either way.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(p) => Some(p.to_path_buf()),
            None => config_path().filter(|p| p.exists()),
        };

        let mut config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(&path).map_err(|e| {
                    super::Error::FileRead {
                        path: path.display().to_string(),
                        error: e.to_string(),
                    }
                })?;
                Self::from_toml(&content)?
            }
            None => Self::default(),
        };

        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| super::Error::ConfigParse(e.to_string()))
    }

    /// Apply `OTP_*` environment overrides through a lookup function
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("OTP_URL") {
            self.server.otp_url = url;
        }
        if let Some(url) = lookup("OTP_MAP_URL") {
            self.server.map_url = url;
        }
        if let Some(dir) = lookup("OTP_CSV_DIR") {
            self.paths.csv_path = PathBuf::from(dir);
        }
        if let Some(report) = lookup("OTP_REPORT") {
            self.paths.report_path = PathBuf::from(report);
        }
    }
}
