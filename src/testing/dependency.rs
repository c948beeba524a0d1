//! Prerequisite resolution
//!
//! A row may name checks of other classes through `req_<Class>` keys. Those
//! checks run first, against the same row, and their result decides whether
//! the row's own suite runs at all.

use crate::common::{Error, Result};

use super::context::ExecContext;
use super::registry::{resolve, TestClass};
use super::row::{DependencyMarker, ParameterRow};
use super::suite::TestSuiteRun;

/// Outcome of running a row's prerequisites
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GateDecision {
    /// Skip every case of the main suite
    pub gated: bool,
    /// Prerequisite cases whose assertions ran
    pub executed: usize,
    /// `check (Class)` of each prerequisite that failed or errored
    pub failed: Vec<String>,
}

/// A marker bound to a known class
#[derive(Debug)]
struct Prerequisite {
    class: TestClass,
    check: Option<String>,
}

/// Resolve every marker of `row` against the registry
///
/// Markers naming `own` are dropped. Any unknown class or check fails the
/// whole row before a prerequisite has run.
fn resolve_markers(row: &ParameterRow, own: TestClass) -> Result<Vec<Prerequisite>> {
    let mut resolved = Vec::new();
    for DependencyMarker {
        key,
        class_name,
        check,
    } in row.dependency_markers()
    {
        let class = resolve(&class_name).ok_or_else(|| Error::DependencyClassNotFound {
            marker: key.clone(),
            class: class_name.clone(),
        })?;

        if class == own {
            tracing::warn!(marker = %key, "ignoring marker naming the row's own class");
            continue;
        }

        if let Some(name) = &check {
            if class.check(name).is_none() {
                return Err(Error::DependencyCheckNotFound {
                    marker: key,
                    class: class.name().to_string(),
                    check: name.clone(),
                });
            }
        }

        resolved.push(Prerequisite { class, check });
    }
    Ok(resolved)
}

/// Run the prerequisites of `row` and decide whether its suite is gated
pub async fn resolve_dependencies(
    row: &ParameterRow,
    row_number: usize,
    own: TestClass,
    ctx: &mut ExecContext<'_>,
) -> Result<GateDecision> {
    let prerequisites = resolve_markers(row, own)?;
    let mut decision = GateDecision::default();

    for prerequisite in prerequisites {
        let mut suite = match &prerequisite.check {
            Some(check) => {
                TestSuiteRun::build_single(prerequisite.class, check, row, row_number, false)
                    .ok_or_else(|| {
                        Error::Internal(format!(
                            "check {} vanished from {}",
                            check, prerequisite.class
                        ))
                    })?
            }
            None => TestSuiteRun::build(prerequisite.class, row, row_number, false),
        };

        suite.run(ctx).await;

        decision.executed += suite.executed_count();
        decision.failed.extend(
            suite
                .cases()
                .iter()
                .filter(|case| case.outcome().is_failure())
                .map(|case| format!("{} ({})", case.check_name(), case.class())),
        );
    }

    decision.gated = decision.executed > 0 && !decision.failed.is_empty();
    if decision.gated {
        tracing::info!(
            class = own.name(),
            row = row_number,
            failed = ?decision.failed,
            "prerequisite failed, skipping suite"
        );
    }
    Ok(decision)
}
