//! Parameterized regression engine
//!
//! Rows read from suite files are bound to test classes, gated on their
//! prerequisites, run through a run-scoped call cache and aggregated into a
//! per-file report.

pub mod case;
pub mod checks;
mod context;
mod dependency;
mod filter;
mod registry;
mod report;
pub mod row;
mod runner;
mod source;
mod suite;

pub use case::{CheckError, CheckResult, Expectation, Outcome, TestCase, DEPENDENCY_FAILED};
pub use context::{ExecContext, RunSettings};
pub use dependency::{resolve_dependencies, GateDecision};
pub use filter::ClassFilter;
pub use registry::{all_classes, resolve, ClassInfo, TestClass};
pub use report::{case_key, Report, ReportEntry};
pub use row::{DependencyMarker, ParamValue, ParameterRow};
pub use runner::{request_urls, PlannedRequest, TestRun};
pub use source::{discover, parse_rows, read_rows, SuiteFile};
pub use suite::TestSuiteRun;
