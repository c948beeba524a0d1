//! Run orchestration
//!
//! Walks discovered suite files in order and, for each row: runs its
//! prerequisites, builds the class suite, runs it and folds the result into
//! the report. Output goes to stdout in the same checkmark style as the
//! other commands; diagnostics go through `tracing`.

use std::sync::Arc;

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use crate::common::{Error, Result};
use crate::http::{CacheStats, CallCache, Transport};

use super::checks::OTP_URL_KEY;
use super::context::{ExecContext, RunSettings};
use super::dependency::resolve_dependencies;
use super::filter::ClassFilter;
use super::registry::TestClass;
use super::report::Report;
use super::row::ParameterRow;
use super::source::SuiteFile;
use super::suite::TestSuiteRun;

/// A single regression run against one service deployment
pub struct TestRun {
    settings: RunSettings,
    filter: ClassFilter,
    transport: Arc<dyn Transport>,
    cache: CallCache,
    overrides: ParameterRow,
    report: Report,
    quiet: bool,
}

impl TestRun {
    pub fn new(settings: RunSettings, filter: ClassFilter, transport: Arc<dyn Transport>) -> Self {
        let mut overrides = ParameterRow::new();
        overrides.insert(OTP_URL_KEY, settings.otp_url.clone());
        Self {
            settings,
            filter,
            transport,
            cache: CallCache::new(),
            overrides,
            report: Report::new(),
            quiet: false,
        }
    }

    /// Force `date` on every row
    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.overrides.insert("date", date.into());
        self
    }

    /// Suppress console output
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    pub fn report(&self) -> &Report {
        &self.report
    }

    pub fn into_report(self) -> Report {
        self.report
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Load every allowed file's rows; an unreadable file aborts the run
    fn load(&self, files: &[SuiteFile]) -> Result<Vec<(SuiteFile, Vec<ParameterRow>)>> {
        let mut plan = Vec::new();
        for file in files {
            if !self.filter.allows(file.class) {
                tracing::info!(file = %file.name, class = %file.class, "class filtered out, skipping file");
                continue;
            }
            let rows = file.load_rows(&self.overrides)?;
            tracing::debug!(file = %file.name, rows = rows.len(), "loaded suite file");
            plan.push((file.clone(), rows));
        }
        Ok(plan)
    }

    /// Run every row of every allowed file
    pub async fn run(&mut self, files: &[SuiteFile]) -> Result<&Report> {
        let plan = self.load(files)?;
        let total_rows: usize = plan.iter().map(|(_, rows)| rows.len()).sum();
        let progress = self.progress_bar(total_rows as u64);

        for (file, rows) in &plan {
            self.say(&progress, format!("\n{} {}", "Suite:".cyan(), file.name.white().bold()));
            for (index, row) in rows.iter().enumerate() {
                progress.set_message(format!("{}:{}", file.name, index + 1));
                self.run_row(file, row, index + 1, &progress).await?;
                progress.inc(1);
            }
        }
        progress.finish_and_clear();

        let stats = self.cache.stats();
        tracing::info!(
            rows = total_rows,
            run = self.report.total_run(),
            failures = self.report.total_failures(),
            errors = self.report.total_errors(),
            cache_hits = stats.hits,
            cache_misses = stats.misses,
            "run finished"
        );
        Ok(&self.report)
    }

    /// Resolve, build, run and record one row
    async fn run_row(
        &mut self,
        file: &SuiteFile,
        row: &ParameterRow,
        row_number: usize,
        progress: &ProgressBar,
    ) -> Result<()> {
        let mut ctx = ExecContext::new(&mut self.cache, self.transport.as_ref(), &self.settings);

        let gate = match resolve_dependencies(row, row_number, file.class, &mut ctx).await {
            Ok(gate) => gate,
            Err(e) if e.is_row_local() => {
                tracing::warn!(file = %file.name, row = row_number, error = %e, "row rejected");
                let marker = rejected_marker(&e);
                self.report.record_configuration_error(
                    &file.name,
                    &marker,
                    row_number,
                    row.description(),
                    &e,
                );
                self.say(
                    progress,
                    format!("  {} {} {}", "✗".red(), label(file.class, row_number, row), e),
                );
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let mut suite = TestSuiteRun::build(file.class, row, row_number, gate.gated);
        suite.run(&mut ctx).await;

        self.report.record(&file.name, &suite, self.settings.verbose);
        let line = suite_line(&suite, row);
        self.say(progress, line);
        Ok(())
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if self.quiet || self.settings.verbose || len == 0 {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("  [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("=> "));
        }
        pb
    }

    fn say(&self, progress: &ProgressBar, line: String) {
        if !self.quiet {
            progress.suspend(|| println!("{}", line));
        }
    }
}

fn rejected_marker(error: &Error) -> String {
    match error {
        Error::DependencyClassNotFound { marker, .. }
        | Error::DependencyCheckNotFound { marker, .. } => marker.clone(),
        _ => super::row::DEPENDENCY_PREFIX.to_string(),
    }
}

fn label(class: TestClass, row_number: usize, row: &ParameterRow) -> String {
    match row.description() {
        Some(desc) => format!("{}:{} ({})", class, row_number, desc),
        None => format!("{}:{}", class, row_number),
    }
}

fn suite_line(suite: &TestSuiteRun, row: &ParameterRow) -> String {
    let name = label(suite.class(), suite.row_number(), row);
    let executed = suite.executed_count();
    let failed = suite.failed_count();
    let skipped = suite.skipped_count();

    if executed == 0 && skipped > 0 {
        let reason = suite
            .cases()
            .first()
            .and_then(|c| c.outcome().message())
            .unwrap_or("skipped");
        format!("  {} {} {}", "-".yellow(), name, reason.dimmed())
    } else if failed > 0 {
        format!(
            "  {} {} {} passed, {} failed, {} skipped",
            "✗".red(),
            name,
            executed - failed,
            failed.to_string().red(),
            skipped
        )
    } else {
        format!(
            "  {} {} {} passed, {} skipped",
            "✓".green(),
            name,
            executed,
            skipped
        )
    }
}

/// A request a row would issue, or why it could not be built
#[derive(Debug, Clone)]
pub struct PlannedRequest {
    pub file: String,
    pub row_number: usize,
    pub class: TestClass,
    pub url: std::result::Result<String, String>,
}

/// Build the request URL of every row without touching the network
pub fn request_urls(
    files: &[SuiteFile],
    settings: &RunSettings,
    filter: &ClassFilter,
) -> Result<Vec<PlannedRequest>> {
    let mut overrides = ParameterRow::new();
    overrides.insert(OTP_URL_KEY, settings.otp_url.clone());

    let mut planned = Vec::new();
    for file in files.iter().filter(|f| filter.allows(f.class)) {
        for (index, row) in file.load_rows(&overrides)?.into_iter().enumerate() {
            let mut row = row;
            let url = file
                .class
                .prepare(&mut row, settings)
                .and_then(|_| file.class.request_url(&row, settings))
                .map_err(|signal| signal.to_string());
            planned.push(PlannedRequest {
                file: file.name.clone(),
                row_number: index + 1,
                class: file.class,
                url,
            });
        }
    }
    Ok(planned)
}
