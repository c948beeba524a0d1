//! Bike rental station checks

use crate::testing::case::{ensure, CheckContext, CheckDef, CheckError, CheckResult, Expectation};

use super::{parse_json, RESPONSE_TIME, RESULT_NOT_NULL, RESULT_TOO_SMALL};

pub const ENDPOINT: &str = "routers/default/bike_rental";

pub const CHECKS: &[CheckDef] = &[
    CheckDef {
        name: "test_not_empty",
        requires: &[],
        expectation: Expectation::Pass,
        run: not_empty,
    },
    RESPONSE_TIME,
    RESULT_NOT_NULL,
    RESULT_TOO_SMALL,
];

fn not_empty(ctx: &CheckContext<'_>) -> CheckResult {
    let doc = parse_json(ctx)?;
    let stations = doc["stations"].as_array().ok_or_else(|| {
        CheckError::Error(format!("{} - response carries no stations list", ctx.url))
    })?;
    ensure(!stations.is_empty(), || {
        format!("{} - stations is empty", ctx.url)
    })
}
