//! Result aggregation
//!
//! Completed suites are folded into one [`ReportEntry`] per source file. The
//! whole [`Report`] is what the run hands to renderers.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::common::{paths, Error, Result};

use super::case::Outcome;
use super::row::ParameterRow;
use super::suite::TestSuiteRun;

/// Aggregated outcomes for one source file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    /// Executed cases
    pub run: usize,
    pub total: usize,
    pub skipped: BTreeMap<String, String>,
    pub failures: BTreeMap<String, String>,
    pub errors: BTreeMap<String, String>,
    /// Passed cases with the parameters they ran with
    pub pass: BTreeMap<String, ParameterRow>,
    /// Names of every check built for this file
    pub tests: BTreeSet<String>,
}

impl ReportEntry {
    /// Fold a finished suite into this entry
    ///
    /// A suite with no executed case leaves the entry untouched.
    pub fn record(&mut self, suite: &TestSuiteRun, verbose: bool) {
        let executed = suite.executed_count();
        if executed == 0 {
            return;
        }

        self.run += executed;
        self.total += executed;

        for case in suite.cases() {
            self.tests.insert(case.check_name().to_string());
            let key = case_key(case.check_name(), suite.row_number(), suite.description());
            match case.outcome() {
                Outcome::Passed => {
                    self.pass.insert(key, case.row().clone());
                }
                Outcome::Failed(msg) => {
                    self.failures.insert(key, summarize(msg, verbose));
                }
                Outcome::Errored(msg) => {
                    self.errors.insert(key, summarize(msg, verbose));
                }
                Outcome::Skipped(reason) => {
                    self.skipped.insert(key, reason.clone());
                }
                Outcome::Pending => {
                    tracing::warn!(key = %key, "case never ran, leaving it out of the report");
                }
            }
        }
    }

    /// Record a row that could not be run because its markers are invalid
    pub fn record_configuration_error(
        &mut self,
        marker: &str,
        row_number: usize,
        description: Option<&str>,
        error: &Error,
    ) {
        self.errors
            .insert(case_key(marker, row_number, description), error.to_string());
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }
}

/// `<check>:<row> (<description>)`, the suffix only when there is a description
pub fn case_key(check: &str, row_number: usize, description: Option<&str>) -> String {
    match description.filter(|d| !d.is_empty()) {
        Some(desc) => format!("{}:{} ({})", check, row_number, desc),
        None => format!("{}:{}", check, row_number),
    }
}

fn summarize(message: &str, verbose: bool) -> String {
    if verbose {
        return message.to_string();
    }
    message
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .unwrap_or(message)
        .trim()
        .to_string()
}

/// Report for a whole run, keyed by source file
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    /// Service the run targeted
    pub otp_url: Option<String>,
    /// Map viewer renderers link itineraries to
    pub map_url: Option<String>,
    pub files: BTreeMap<String, ReportEntry>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry for `file`, created on first use
    pub fn entry(&mut self, file: &str) -> &mut ReportEntry {
        self.files.entry(file.to_string()).or_default()
    }

    pub fn record(&mut self, file: &str, suite: &TestSuiteRun, verbose: bool) {
        if suite.executed_count() == 0 {
            return;
        }
        self.entry(file).record(suite, verbose);
    }

    pub fn record_configuration_error(
        &mut self,
        file: &str,
        marker: &str,
        row_number: usize,
        description: Option<&str>,
        error: &Error,
    ) {
        self.entry(file)
            .record_configuration_error(marker, row_number, description, error);
    }

    pub fn total_run(&self) -> usize {
        self.files.values().map(|e| e.run).sum()
    }

    pub fn total_failures(&self) -> usize {
        self.files.values().map(ReportEntry::failure_count).sum()
    }

    pub fn total_errors(&self) -> usize {
        self.files.values().map(|e| e.errors.len()).sum()
    }

    pub fn total_skipped(&self) -> usize {
        self.files.values().map(|e| e.skipped.len()).sum()
    }

    /// No file recorded a failure
    pub fn overall_pass(&self) -> bool {
        self.total_failures() == 0
    }

    /// Serialize the report with its overall verdict
    pub fn to_json(&self) -> Result<String> {
        #[derive(Serialize)]
        struct Artifact<'a> {
            overall_pass: bool,
            #[serde(skip_serializing_if = "Option::is_none")]
            otp_url: Option<&'a str>,
            #[serde(skip_serializing_if = "Option::is_none")]
            map_url: Option<&'a str>,
            files: &'a BTreeMap<String, ReportEntry>,
        }

        let artifact = Artifact {
            overall_pass: self.overall_pass(),
            otp_url: self.otp_url.as_deref(),
            map_url: self.map_url.as_deref().filter(|u| !u.is_empty()),
            files: &self.files,
        };
        Ok(serde_json::to_string_pretty(&artifact)?)
    }

    /// Write the JSON report to `path`, creating parent directories
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let write_err = |e: std::io::Error| Error::ReportWrite {
            path: path.display().to_string(),
            error: e.to_string(),
        };
        let json = self.to_json()?;
        paths::ensure_parent_dir(path).map_err(write_err)?;
        std::fs::write(path, json).map_err(write_err)?;
        tracing::info!(path = %path.display(), "report written");
        Ok(())
    }
}
