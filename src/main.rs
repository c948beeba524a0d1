//! OTP regression runner - data-driven checks against a trip planner
//!
//! Reads suites of CSV rows, runs them against an OpenTripPlanner server and
//! writes a JSON report.

use std::path::PathBuf;

use clap::Parser;
use ott::common::config::Config;
use ott::{cli, commands, common};
use commands::Commands;

#[derive(Parser)]
#[command(name = "ott", about = "Regression suites for OpenTripPlanner deployments")]
#[command(version, long_about = None)]
struct Cli {
    /// Debug-level logging
    #[arg(long, global = true)]
    debug: bool,

    /// Configuration file (default: the platform config directory)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Also write logs to a file (default: ott.log in the platform data directory)
    #[arg(long, global = true, value_name = "FILE", num_args = 0..=1)]
    log_file: Option<Option<PathBuf>>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_file = cli
        .log_file
        .clone()
        .and_then(|path| path.or_else(common::paths::default_log_path));
    common::logging::init_cli(cli.debug, log_file.as_deref());

    let result = match Config::load(cli.config.as_deref()) {
        Ok(config) => cli::dispatch(cli.command, config).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
