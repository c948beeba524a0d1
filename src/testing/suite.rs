//! Suite building and running
//!
//! A suite is every declared check of one class bound to one row. Cases run
//! in declared order; a failing case never stops its siblings.

use super::case::{Outcome, TestCase};
use super::context::ExecContext;
use super::registry::TestClass;
use super::row::ParameterRow;

/// The cases built from one row against one class
#[derive(Debug, Clone)]
pub struct TestSuiteRun {
    class: TestClass,
    row_number: usize,
    description: Option<String>,
    cases: Vec<TestCase>,
}

impl TestSuiteRun {
    /// One case per declared check, each with its own copy of `row`
    pub fn build(class: TestClass, row: &ParameterRow, row_number: usize, gated: bool) -> Self {
        let cases = class
            .checks()
            .iter()
            .map(|check| TestCase::new(class, check, row, gated))
            .collect();
        Self::from_cases(class, row, row_number, cases)
    }

    /// A suite holding only `check` of `class`
    ///
    /// Returns `None` if the class does not declare the check.
    pub fn build_single(
        class: TestClass,
        check: &str,
        row: &ParameterRow,
        row_number: usize,
        gated: bool,
    ) -> Option<Self> {
        let case = class.construct(check, row, gated)?;
        Some(Self::from_cases(class, row, row_number, vec![case]))
    }

    fn from_cases(
        class: TestClass,
        row: &ParameterRow,
        row_number: usize,
        cases: Vec<TestCase>,
    ) -> Self {
        Self {
            class,
            row_number,
            description: row.description().map(str::to_string),
            cases,
        }
    }

    /// Run every pending case in order
    ///
    /// The suite's request is issued once, by the first case that gets past
    /// its gate and preparation; later cases check that same response.
    pub async fn run(&mut self, ctx: &mut ExecContext<'_>) {
        let mut shared = None;
        for case in &mut self.cases {
            case.run_with(ctx, &mut shared).await;
        }
        tracing::debug!(
            class = self.class.name(),
            row = self.row_number,
            executed = self.executed_count(),
            skipped = self.skipped_count(),
            failed = self.failed_count(),
            "suite finished"
        );
    }

    pub fn class(&self) -> TestClass {
        self.class
    }

    pub fn row_number(&self) -> usize {
        self.row_number
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }

    pub fn cases_mut(&mut self) -> &mut [TestCase] {
        &mut self.cases
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// Cases whose assertions ran
    pub fn executed_count(&self) -> usize {
        self.cases.iter().filter(|c| c.outcome().is_executed()).count()
    }

    pub fn skipped_count(&self) -> usize {
        self.cases
            .iter()
            .filter(|c| matches!(c.outcome(), Outcome::Skipped(_)))
            .count()
    }

    /// Cases that ended Failed or Errored
    pub fn failed_count(&self) -> usize {
        self.cases.iter().filter(|c| c.outcome().is_failure()).count()
    }

    /// Every case ran and passed
    pub fn succeeded(&self) -> bool {
        self.cases.iter().all(TestCase::success)
    }
}
