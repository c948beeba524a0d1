//! Check implementations, one module per test class
//!
//! Every class shares the response checks defined here; class modules add
//! their own and list them, in declared order, in a `CHECKS` table.

pub mod bike_rental;
pub mod otp_version;
pub mod planner;

use url::Url;

use crate::common::normalize_base_url;

use super::case::{ensure, CheckContext, CheckDef, CheckError, CheckResult, Expectation};
use super::context::RunSettings;
use super::row::ParameterRow;

/// Row parameters forwarded to the service, in query order
pub const QUERY_PARAMS: &[&str] = &[
    "address",
    "bbox",
    "fromPlace",
    "toPlace",
    "maxWalkDistance",
    "mode",
    "optimize",
    "arriveBy",
    "departBy",
    "date",
    "time",
    "showIntermediateStops",
];

/// Row key overriding the service base URL
pub const OTP_URL_KEY: &str = "otp_url";

/// Smallest body, in characters, not considered suspicious
pub const MIN_RESULT_CHARS: usize = 1000;

pub(crate) const RESPONSE_TIME: CheckDef = CheckDef {
    name: "test_response_time",
    requires: &[],
    expectation: Expectation::Pass,
    run: response_time,
};

pub(crate) const RESULT_NOT_NULL: CheckDef = CheckDef {
    name: "test_result_not_null",
    requires: &[],
    expectation: Expectation::Pass,
    run: result_not_null,
};

pub(crate) const RESULT_TOO_SMALL: CheckDef = CheckDef {
    name: "test_result_too_small",
    requires: &[],
    expectation: Expectation::Pass,
    run: result_too_small,
};

fn response_time(ctx: &CheckContext<'_>) -> CheckResult {
    let limit = ctx.settings.max_response_time;
    ensure(ctx.response.elapsed <= limit, || {
        format!(
            "{} took longer than {} seconds ({:.1}s)",
            ctx.url,
            limit.as_secs(),
            ctx.response.elapsed.as_secs_f64()
        )
    })
}

fn result_not_null(ctx: &CheckContext<'_>) -> CheckResult {
    ensure(ctx.response.body.is_some(), || match &ctx.response.error {
        Some(error) => format!("{} - result is null ({})", ctx.url, error),
        None => format!("{} - result is null", ctx.url),
    })
}

fn result_too_small(ctx: &CheckContext<'_>) -> CheckResult {
    let chars = ctx.response.text().chars().count();
    ensure(chars > MIN_RESULT_CHARS, || {
        format!("{} - result looks small ({} characters)", ctx.url, chars)
    })
}

/// Request URL for `endpoint` carrying the row's forwarded parameters
pub fn build_url(
    endpoint: &str,
    row: &ParameterRow,
    settings: &RunSettings,
) -> Result<String, CheckError> {
    let base = normalize_base_url(row.text(OTP_URL_KEY).unwrap_or(&settings.otp_url));
    let mut url = Url::parse(&base)
        .and_then(|base| base.join(endpoint))
        .map_err(|e| CheckError::Error(format!("invalid service URL '{}': {}", base, e)))?;

    let pairs: Vec<(&str, String)> = QUERY_PARAMS
        .iter()
        .filter_map(|name| {
            row.get(name)
                .filter(|value| !value.is_empty())
                .map(|value| (*name, value.to_string()))
        })
        .collect();

    if !pairs.is_empty() {
        url.query_pairs_mut().extend_pairs(pairs);
    }

    Ok(url.to_string())
}

/// Parse the response body as JSON
pub(crate) fn parse_json(ctx: &CheckContext<'_>) -> Result<serde_json::Value, CheckError> {
    let body = ctx
        .response
        .body
        .as_deref()
        .ok_or_else(|| CheckError::Error(format!("{} - no response body to parse", ctx.url)))?;
    serde_json::from_str(body)
        .map_err(|e| CheckError::Error(format!("{} - invalid JSON response: {}", ctx.url, e)))
}

/// Integer value of a row parameter
pub(crate) fn int_param(row: &ParameterRow, key: &str) -> Result<i64, CheckError> {
    let raw = row.text(key).unwrap_or("");
    raw.trim().parse().map_err(|_| {
        CheckError::Error(format!("parameter '{}' must be an integer, got '{}'", key, raw))
    })
}

/// Floating point value of a row parameter
pub(crate) fn float_param(row: &ParameterRow, key: &str) -> Result<f64, CheckError> {
    let raw = row.text(key).unwrap_or("");
    raw.trim().parse().map_err(|_| {
        CheckError::Error(format!("parameter '{}' must be a number, got '{}'", key, raw))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Response;
    use chrono::NaiveDate;
    use std::time::Duration;

    fn settings() -> RunSettings {
        RunSettings::new(
            "http://localhost:8080/otp/",
            NaiveDate::from_ymd_opt(2024, 5, 15).unwrap(),
        )
    }

    fn response(body: Option<&str>, elapsed_secs: u64) -> Response {
        Response {
            body: body.map(str::to_string),
            elapsed: Duration::from_secs(elapsed_secs),
            error: None,
        }
    }

    #[test]
    fn test_build_url_forwards_whitelisted_params_in_order() {
        let row = ParameterRow::from_pairs([
            ("toPlace", "28.06,-82.41"),
            ("fromPlace", "28.05,-82.40"),
            ("mode", "BICYCLE"),
            ("duration", "900"),
            ("req_OTPVersion", "test_version"),
        ]);
        let url = build_url("routers/default/plan", &row, &settings()).unwrap();
        assert_eq!(
            url,
            "http://localhost:8080/otp/routers/default/plan?fromPlace=28.05%2C-82.40&toPlace=28.06%2C-82.41&mode=BICYCLE"
        );
    }

    #[test]
    fn test_build_url_without_params_has_no_query() {
        let url = build_url("", &ParameterRow::new(), &settings()).unwrap();
        assert_eq!(url, "http://localhost:8080/otp/");
    }

    #[test]
    fn test_build_url_row_base_overrides_settings() {
        let row = ParameterRow::from_pairs([("otp_url", "http://other:9090/otp")]);
        let url = build_url("routers/default/bike_rental", &row, &settings()).unwrap();
        assert_eq!(url, "http://other:9090/otp/routers/default/bike_rental");
    }

    #[test]
    fn test_build_url_rejects_garbage_base() {
        let row = ParameterRow::from_pairs([("otp_url", "not a url")]);
        assert!(matches!(
            build_url("", &row, &settings()),
            Err(CheckError::Error(_))
        ));
    }

    #[test]
    fn test_shared_checks() {
        let settings = settings();
        let row = ParameterRow::new();
        let big = "x".repeat(MIN_RESULT_CHARS + 1);

        let ok = response(Some(&big), 1);
        let ctx = CheckContext {
            row: &row,
            url: "http://otp/",
            response: &ok,
            settings: &settings,
        };
        assert_eq!(response_time(&ctx), Ok(()));
        assert_eq!(result_not_null(&ctx), Ok(()));
        assert_eq!(result_too_small(&ctx), Ok(()));

        let slow_small = response(Some("{}"), 31);
        let ctx = CheckContext {
            response: &slow_small,
            ..ctx
        };
        assert!(matches!(response_time(&ctx), Err(CheckError::Failure(_))));
        assert!(matches!(result_too_small(&ctx), Err(CheckError::Failure(_))));

        let failed = Response::failed("connection refused");
        let ctx = CheckContext {
            response: &failed,
            ..ctx
        };
        match result_not_null(&ctx) {
            Err(CheckError::Failure(msg)) => assert!(msg.contains("connection refused")),
            other => panic!("Expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_int_param() {
        let row = ParameterRow::from_pairs([("major", " 1 "), ("minor", "x")]);
        assert_eq!(int_param(&row, "major"), Ok(1));
        assert!(matches!(int_param(&row, "minor"), Err(CheckError::Error(_))));
        assert!(matches!(int_param(&row, "absent"), Err(CheckError::Error(_))));
    }
}
