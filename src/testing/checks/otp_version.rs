//! Server info checks
//!
//! The server info document is small by nature, so the shared size check is
//! declared as an expected failure here.

use crate::testing::case::{ensure, CheckContext, CheckDef, CheckError, CheckResult, Expectation};

use super::{int_param, parse_json, RESPONSE_TIME, RESULT_NOT_NULL, RESULT_TOO_SMALL};

/// Server info lives at the service root
pub const ENDPOINT: &str = "";

pub const CHECKS: &[CheckDef] = &[
    RESPONSE_TIME,
    RESULT_NOT_NULL,
    CheckDef {
        expectation: Expectation::ExpectedFail,
        ..RESULT_TOO_SMALL
    },
    CheckDef {
        name: "test_version",
        requires: &["major", "minor"],
        expectation: Expectation::Pass,
        run: version,
    },
];

fn version(ctx: &CheckContext<'_>) -> CheckResult {
    let major = int_param(ctx.row, "major")?;
    let minor = int_param(ctx.row, "minor")?;

    let doc = parse_json(ctx)?;
    let server = &doc["serverVersion"];
    let (server_major, server_minor) = match (server["major"].as_i64(), server["minor"].as_i64()) {
        (Some(major), Some(minor)) => (major, minor),
        _ => {
            return Err(CheckError::Error(format!(
                "{} - response carries no serverVersion",
                ctx.url
            )))
        }
    };

    ensure(major == server_major && minor == server_minor, || {
        format!(
            "OTP version mismatch - {}.{} != {}.{}",
            major, minor, server_major, server_minor
        )
    })
}
