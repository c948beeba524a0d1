//! CLI command handling
//!
//! Applies command-line overrides to the loaded configuration, drives the
//! run and formats output.

use std::sync::Arc;

use chrono::NaiveDate;
use colored::Colorize;

use crate::commands::{Commands, RunArgs, SourceArgs};
use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::http::HttpTransport;
use crate::testing::{self, ClassFilter, RunSettings, TestRun};

/// Dispatch a CLI command, returning the process exit status
pub async fn dispatch(command: Commands, mut config: Config) -> Result<i32> {
    match command {
        Commands::Run(args) => {
            apply_source(&mut config, &args.source);
            if let Some(path) = &args.report_path {
                config.paths.report_path = path.clone();
            }
            run(config, args).await
        }

        Commands::Urls { source } => {
            apply_source(&mut config, &source);
            let settings = RunSettings::from_config(&config, today());
            let filter = ClassFilter::new(
                config.filters.skip.as_slice(),
                config.filters.only.as_slice(),
            );
            let files = testing::discover(&config.paths.csv_path)?;

            for planned in testing::request_urls(&files, &settings, &filter)? {
                match planned.url {
                    Ok(url) => println!("{}", url),
                    Err(reason) => eprintln!(
                        "{}:{} ({}): {}",
                        planned.file, planned.row_number, planned.class, reason
                    ),
                }
            }
            Ok(0)
        }

        Commands::Classes => {
            for info in testing::all_classes() {
                println!(
                    "{} {}",
                    info.name.white().bold(),
                    format!("[{} {}]", info.format, display_endpoint(info.endpoint)).dimmed()
                );
                println!("  {}", info.description);
                for check in info.checks {
                    println!("    - {}", check.name);
                }
            }
            Ok(0)
        }
    }
}

fn apply_source(config: &mut Config, source: &SourceArgs) {
    if let Some(url) = &source.otp_url {
        config.server.otp_url = url.clone();
    }
    if let Some(path) = &source.csv_path {
        config.paths.csv_path = path.clone();
    }
    if !source.skip.is_empty() {
        config.filters.skip = source.skip.clone();
    }
    if !source.only.is_empty() {
        config.filters.only = source.only.clone();
    }
}

async fn run(config: Config, args: RunArgs) -> Result<i32> {
    let date = args.date.as_deref().map(parse_date).transpose()?;

    let mut settings = RunSettings::from_config(&config, today());
    settings.verbose = args.verbose;

    let filter = ClassFilter::new(
        config.filters.skip.as_slice(),
        config.filters.only.as_slice(),
    );
    let files = testing::discover(&config.paths.csv_path)?;

    println!(
        "\n{} {}",
        "Running suites from".blue().bold(),
        config.paths.csv_path.display().to_string().white().bold()
    );
    println!("  against {}", settings.otp_url.dimmed());

    let mut test_run = TestRun::new(settings, filter, Arc::new(HttpTransport::new()));
    if let Some(date) = date {
        test_run = test_run.with_date(date.format("%Y-%m-%d").to_string());
    }
    test_run.run(&files).await?;

    let otp_url = test_run.settings().otp_url.clone();
    let stats = test_run.cache_stats();
    let mut report = test_run.into_report();
    report.otp_url = Some(otp_url);
    report.map_url = Some(config.server.map_url.clone());
    report.write_json(&config.paths.report_path)?;

    let passed = report.overall_pass();
    println!(
        "\n{} {} run, {} failures, {} errors, {} skipped ({} requests, {} cached)",
        if passed { "✓".green().bold() } else { "✗".red().bold() },
        report.total_run(),
        report.total_failures(),
        report.total_errors(),
        report.total_skipped(),
        stats.misses,
        stats.hits,
    );
    println!(
        "  Report: {}\n",
        config.paths.report_path.display().to_string().dimmed()
    );

    Ok(if args.strict && !passed { 1 } else { 0 })
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|e| {
            Error::Config(format!(
                "Invalid --date '{}' (expected YYYY-MM-DD): {}",
                raw, e
            ))
        })
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn display_endpoint(endpoint: &str) -> &str {
    if endpoint.is_empty() {
        "/"
    } else {
        endpoint
    }
}
