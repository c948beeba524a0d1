//! Test cases and their outcomes
//!
//! A case pairs one declared check with a private copy of a row. Running it
//! walks `Pending → Skipped` or `Pending → Running → Passed | Failed | Errored`;
//! the terminal outcome is set exactly once.

use std::fmt;

use crate::http::Response;

use super::context::{ExecContext, RunSettings};
use super::registry::TestClass;
use super::row::ParameterRow;

/// Skip reason for cases whose prerequisite failed
pub const DEPENDENCY_FAILED: &str = "dependency check failed";

/// Terminal state of a case
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Outcome {
    #[default]
    Pending,
    Skipped(String),
    Passed,
    Failed(String),
    Errored(String),
}

impl Outcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Outcome::Pending)
    }

    /// Whether assertions actually ran
    pub fn is_executed(&self) -> bool {
        matches!(self, Outcome::Passed | Outcome::Failed(_) | Outcome::Errored(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failed(_) | Outcome::Errored(_))
    }

    /// Diagnostic text or skip reason
    pub fn message(&self) -> Option<&str> {
        match self {
            Outcome::Skipped(m) | Outcome::Failed(m) | Outcome::Errored(m) => Some(m),
            Outcome::Pending | Outcome::Passed => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Outcome::Pending => "pending",
            Outcome::Skipped(_) => "skipped",
            Outcome::Passed => "passed",
            Outcome::Failed(_) => "failed",
            Outcome::Errored(_) => "errored",
        };
        write!(f, "{}", label)
    }
}

/// Signal a check raises to end its case early
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckError {
    /// An expectation did not hold
    Failure(String),
    /// The check could not evaluate (malformed data or parameters)
    Error(String),
    /// The check does not apply to this row
    Skip(String),
}

impl fmt::Display for CheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckError::Failure(m) => write!(f, "failure: {}", m),
            CheckError::Error(m) => write!(f, "error: {}", m),
            CheckError::Skip(m) => write!(f, "skipped: {}", m),
        }
    }
}

/// Result of evaluating one check
pub type CheckResult = std::result::Result<(), CheckError>;

/// Fail with `message` unless `condition` holds
pub fn ensure(condition: bool, message: impl FnOnce() -> String) -> CheckResult {
    if condition {
        Ok(())
    } else {
        Err(CheckError::Failure(message()))
    }
}

/// How a check's result is classified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Expectation {
    /// Passing assertions mean the case passed
    #[default]
    Pass,
    /// The assertion is known to fail against this endpoint
    ExpectedFail,
}

/// What a check sees while it runs
pub struct CheckContext<'a> {
    pub row: &'a ParameterRow,
    pub url: &'a str,
    pub response: &'a Response,
    pub settings: &'a RunSettings,
}

/// A declared check of a test class
pub struct CheckDef {
    /// Check name as it appears in reports and `req_` markers
    pub name: &'static str,
    /// Optional row fields the check needs; absent or empty means skip
    pub requires: &'static [&'static str],
    pub expectation: Expectation,
    pub run: fn(&CheckContext<'_>) -> CheckResult,
}

impl fmt::Debug for CheckDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckDef")
            .field("name", &self.name)
            .field("requires", &self.requires)
            .field("expectation", &self.expectation)
            .finish_non_exhaustive()
    }
}

/// One check bound to one row
#[derive(Debug, Clone)]
pub struct TestCase {
    class: TestClass,
    check: &'static CheckDef,
    row: ParameterRow,
    gated: bool,
    outcome: Outcome,
    request: Option<String>,
}

impl TestCase {
    /// Build a case owning a deep copy of `row`
    pub fn new(class: TestClass, check: &'static CheckDef, row: &ParameterRow, gated: bool) -> Self {
        Self {
            class,
            check,
            row: row.clone(),
            gated,
            outcome: Outcome::Pending,
            request: None,
        }
    }

    pub fn class(&self) -> TestClass {
        self.class
    }

    pub fn check_name(&self) -> &'static str {
        self.check.name
    }

    pub fn row(&self) -> &ParameterRow {
        &self.row
    }

    pub fn row_mut(&mut self) -> &mut ParameterRow {
        &mut self.row
    }

    pub fn is_gated(&self) -> bool {
        self.gated
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    /// URL this case requested, once it has run
    pub fn request_url(&self) -> Option<&str> {
        self.request.as_deref()
    }

    pub fn success(&self) -> bool {
        self.outcome == Outcome::Passed
    }

    /// Run the case to its terminal outcome
    ///
    /// Running an already terminal case is a no-op.
    pub async fn run(&mut self, ctx: &mut ExecContext<'_>) -> &Outcome {
        self.run_with(ctx, &mut None).await
    }

    /// Run the case, reusing `shared` when it holds a response for this
    /// case's request
    ///
    /// A fetch made here is stored in `shared`, so sibling cases observe the
    /// same body and elapsed time.
    pub async fn run_with(
        &mut self,
        ctx: &mut ExecContext<'_>,
        shared: &mut Option<(String, Response)>,
    ) -> &Outcome {
        if self.outcome.is_terminal() {
            return &self.outcome;
        }

        if self.gated {
            self.outcome = Outcome::Skipped(DEPENDENCY_FAILED.to_string());
            return &self.outcome;
        }

        if let Some(missing) = self
            .check
            .requires
            .iter()
            .find(|field| !self.row.has_value(field))
        {
            self.outcome = Outcome::Skipped(format!("missing parameter '{}'", missing));
            return &self.outcome;
        }

        let settings = ctx.settings;
        let prepared = self
            .class
            .prepare(&mut self.row, settings)
            .and_then(|_| self.class.request_url(&self.row, settings));

        let url = match prepared {
            Ok(url) => url,
            Err(signal) => {
                self.outcome = self.classify(None, Err(signal));
                return &self.outcome;
            }
        };

        let response = match shared.as_ref() {
            Some((shared_url, response)) if *shared_url == url => response.clone(),
            _ => {
                let response = ctx.fetch(&url, self.class.format()).await;
                *shared = Some((url.clone(), response.clone()));
                response
            }
        };
        let result = (self.check.run)(&CheckContext {
            row: &self.row,
            url: &url,
            response: &response,
            settings,
        });

        self.outcome = self.classify(Some(&url), result);
        tracing::debug!(
            class = self.class.name(),
            check = self.check.name,
            outcome = %self.outcome,
            "case finished"
        );
        self.request = Some(url);
        &self.outcome
    }

    /// Map a check result to an outcome, honoring the declared expectation
    fn classify(&self, url: Option<&str>, result: CheckResult) -> Outcome {
        match (self.check.expectation, result) {
            (_, Err(CheckError::Skip(reason))) => Outcome::Skipped(reason),
            (_, Err(CheckError::Error(msg))) => {
                Outcome::Errored(self.diagnostic(url, "Error", &msg))
            }
            (Expectation::Pass, Ok(())) => Outcome::Passed,
            (Expectation::Pass, Err(CheckError::Failure(msg))) => {
                Outcome::Failed(self.diagnostic(url, "AssertionError", &msg))
            }
            (Expectation::ExpectedFail, Err(CheckError::Failure(msg))) => {
                tracing::debug!(check = self.check.name, %msg, "expected failure");
                Outcome::Passed
            }
            (Expectation::ExpectedFail, Ok(())) => Outcome::Failed(self.diagnostic(
                url,
                "UnexpectedSuccess",
                "check passed but is declared as an expected failure",
            )),
        }
    }

    fn diagnostic(&self, url: Option<&str>, kind: &str, message: &str) -> String {
        let mut text = format!("{} ({})", self.check.name, self.class.name());
        if let Some(url) = url {
            text.push_str("\n  request: ");
            text.push_str(url);
        }
        text.push('\n');
        text.push_str(kind);
        text.push_str(": ");
        text.push_str(message);
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_predicates() {
        assert!(!Outcome::Pending.is_terminal());
        assert!(Outcome::Skipped("x".into()).is_terminal());
        assert!(!Outcome::Skipped("x".into()).is_executed());
        assert!(Outcome::Passed.is_executed());
        assert!(Outcome::Errored("e".into()).is_failure());
        assert!(!Outcome::Passed.is_failure());
        assert_eq!(Outcome::Failed("boom".into()).message(), Some("boom"));
    }

    #[test]
    fn test_ensure() {
        assert_eq!(ensure(true, || "never".into()), Ok(()));
        assert_eq!(
            ensure(false, || "mismatch".into()),
            Err(CheckError::Failure("mismatch".into()))
        );
    }

    #[test]
    fn test_new_case_copies_row() {
        let row = ParameterRow::from_pairs([("fromPlace", "A"), ("toPlace", "B")]);
        let check = TestClass::UsfPlanner.check("test_no_errors").unwrap();
        let mut case = TestCase::new(TestClass::UsfPlanner, check, &row, false);

        case.row_mut().insert("fromPlace", "Z");
        assert_eq!(row.text("fromPlace"), Some("A"));
        assert_eq!(case.row().text("fromPlace"), Some("Z"));
        assert_eq!(case.outcome(), &Outcome::Pending);
    }

    #[test]
    fn test_expected_failure_classification() {
        let row = ParameterRow::new();
        let check = TestClass::OtpVersion.check("test_result_too_small").unwrap();
        let case = TestCase::new(TestClass::OtpVersion, check, &row, false);

        assert_eq!(
            case.classify(None, Err(CheckError::Failure("small".into()))),
            Outcome::Passed
        );
        match case.classify(Some("http://otp/"), Ok(())) {
            Outcome::Failed(msg) => {
                assert!(msg.starts_with("test_result_too_small (OTPVersion)"));
                assert!(msg.lines().last().unwrap().starts_with("UnexpectedSuccess"));
            }
            other => panic!("Expected Failed, got {:?}", other),
        }
    }

    #[test]
    fn test_diagnostic_last_line_is_the_assertion() {
        let row = ParameterRow::new();
        let check = TestClass::UsfBikeRental.check("test_not_empty").unwrap();
        let case = TestCase::new(TestClass::UsfBikeRental, check, &row, false);

        let outcome = case.classify(
            Some("http://otp/routers/default/bike_rental"),
            Err(CheckError::Failure("stations is empty".into())),
        );
        let msg = outcome.message().unwrap();
        assert_eq!(msg.lines().count(), 3);
        assert_eq!(msg.lines().last(), Some("AssertionError: stations is empty"));
    }
}
