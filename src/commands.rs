//! CLI command definitions
//!
//! Defines the clap commands for the regression runner.

use clap::{Args, Subcommand};
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Run every discovered suite and write the report
    Run(RunArgs),

    /// Print the request URL each row would issue, without calling the service
    Urls {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// List the known test classes and their checks
    Classes,
}

/// Where suites come from and which service they target
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Base URL of the trip planner (e.g. http://localhost:8080/otp/)
    #[arg(long, short = 'u')]
    pub otp_url: Option<String>,

    /// Suite directory (one subdirectory per test class) or a single CSV file
    #[arg(long, short = 'c')]
    pub csv_path: Option<PathBuf>,

    /// Skip these test classes (repeatable)
    #[arg(long, value_name = "CLASS")]
    pub skip: Vec<String>,

    /// Run only these test classes (repeatable)
    #[arg(long, value_name = "CLASS")]
    pub only: Vec<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Where to write the JSON report
    #[arg(long, short = 'r')]
    pub report_path: Option<PathBuf>,

    /// Plan trips for this date (YYYY-MM-DD) instead of each row's own
    #[arg(long)]
    pub date: Option<String>,

    /// Keep full diagnostics in the report and disable the progress bar
    #[arg(long, short)]
    pub verbose: bool,

    /// Exit with status 1 when any check fails
    #[arg(long)]
    pub strict: bool,
}
