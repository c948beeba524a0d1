//! OTP regression runner - data-driven checks against a trip planner
//!
//! Suites of CSV rows are turned into checks against an OpenTripPlanner
//! deployment; prerequisites gate rows, repeated requests are served from a
//! run-scoped cache and every outcome lands in a JSON report.

pub mod cli;
pub mod commands;
pub mod common;
pub mod http;
pub mod testing;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use testing::{ParameterRow, Report, TestClass, TestRun};
