//! Trip planner checks
//!
//! The planner is queried for XML itineraries and inspected with patterns.
//! Row preparation fills in the service date and decodes coordinates on the
//! case's own copy of the row.

use chrono::{Datelike, Duration as Days, NaiveDate};
use regex::Regex;
use std::collections::BTreeSet;
use percent_encoding::percent_decode_str;

use crate::testing::case::{ensure, CheckContext, CheckDef, CheckError, CheckResult, Expectation};
use crate::testing::context::RunSettings;
use crate::testing::row::ParameterRow;

use super::{float_param, RESPONSE_TIME, RESULT_NOT_NULL, RESULT_TOO_SMALL};

pub const ENDPOINT: &str = "routers/default/plan";

/// Allowed relative deviation of itinerary duration and distance
pub const TOLERANCE: f64 = 0.2;

pub const CHECKS: &[CheckDef] = &[
    CheckDef {
        name: "test_expected_output",
        requires: &["expected_output"],
        expectation: Expectation::Pass,
        run: expected_output,
    },
    CheckDef {
        name: "test_invalid_modes",
        requires: &["invalid_modes"],
        expectation: Expectation::Pass,
        run: invalid_modes,
    },
    CheckDef {
        name: "test_no_errors",
        requires: &[],
        expectation: Expectation::Pass,
        run: no_errors,
    },
    RESPONSE_TIME,
    RESULT_NOT_NULL,
    RESULT_TOO_SMALL,
    CheckDef {
        name: "test_trip_distance",
        requires: &["distance"],
        expectation: Expectation::Pass,
        run: trip_distance,
    },
    CheckDef {
        name: "test_trip_duration",
        requires: &["duration"],
        expectation: Expectation::Pass,
        run: trip_duration,
    },
    CheckDef {
        name: "test_trip_num_legs",
        requires: &["num_legs"],
        expectation: Expectation::Pass,
        run: trip_num_legs,
    },
];

/// Complete the row before the request is built
///
/// Missing coordinates fail the case. Coordinates are percent-decoded so the
/// URL builder encodes them exactly once. An absent `date` is derived from
/// `service`.
pub fn prepare(row: &mut ParameterRow, settings: &RunSettings) -> CheckResult {
    for key in ["fromPlace", "toPlace"] {
        let decoded = match row.text(key) {
            Some(raw) => decode_component(raw),
            None => {
                return Err(CheckError::Failure(format!(
                    "{} missing to or from coordinates",
                    ENDPOINT
                )))
            }
        };
        row.insert(key, decoded);
    }

    if !row.has_value("date") {
        let date = service_date(row.text("service"), settings.today);
        row.insert("date", date.format("%Y-%m-%d").to_string());
    }

    Ok(())
}

/// Date to plan for, given an optional `Saturday`/`Sunday` service
pub fn service_date(service: Option<&str>, today: NaiveDate) -> NaiveDate {
    let weekday = i64::from(today.weekday().num_days_from_monday());
    match service.map(str::trim) {
        None => today,
        Some("Saturday") if weekday == 6 => today + Days::days(6),
        Some("Saturday") => today + Days::days(5 - weekday),
        Some("Sunday") => today + Days::days(6 - weekday),
        Some(other) => {
            tracing::warn!(service = other, "unknown service day, planning for today");
            today
        }
    }
}

fn decode_component(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

fn pattern(re: &str) -> Result<Regex, CheckError> {
    Regex::new(re).map_err(|e| CheckError::Error(format!("invalid pattern '{}': {}", re, e)))
}

/// Values of `<tag>` inside each itinerary
fn itinerary_values(body: &str, tag: &str) -> Result<Vec<String>, CheckError> {
    let re = pattern(&format!(
        r"(?s)<itinerary>.*?<{tag}>(.*?)</{tag}>.*?</itinerary>",
        tag = regex::escape(tag)
    ))?;
    Ok(re
        .captures_iter(body)
        .map(|c| c[1].trim().to_string())
        .collect())
}

fn within_tolerance(ctx: &CheckContext<'_>, key: &str, tag: &str) -> CheckResult {
    let expected = float_param(ctx.row, key)?;
    let low = expected * (1.0 - TOLERANCE);
    let high = expected * (1.0 + TOLERANCE);

    for raw in itinerary_values(ctx.response.text(), tag)? {
        let value: f64 = raw.parse().map_err(|_| {
            CheckError::Error(format!("itinerary {} '{}' is not a number", tag, raw))
        })?;
        ensure(value >= low && value <= high, || {
            format!(
                "An itinerary {} was different than expected by more than {}% ({} vs {}).",
                tag,
                TOLERANCE * 100.0,
                value,
                expected
            )
        })?;
    }
    Ok(())
}

fn expected_output(ctx: &CheckContext<'_>) -> CheckResult {
    let expected = ctx.row.text("expected_output").unwrap_or("");
    let re = pattern(expected)?;
    ensure(re.is_match(ctx.response.text()), || {
        format!("Couldn't find {} in otp response.", expected)
    })
}

fn trip_duration(ctx: &CheckContext<'_>) -> CheckResult {
    within_tolerance(ctx, "duration", "duration")
}

fn trip_distance(ctx: &CheckContext<'_>) -> CheckResult {
    within_tolerance(ctx, "distance", "distance")
}

fn trip_num_legs(ctx: &CheckContext<'_>) -> CheckResult {
    let raw = ctx.row.text("num_legs").unwrap_or("");
    let bounds: Vec<usize> = raw
        .split('|')
        .map(|part| part.trim().parse())
        .collect::<Result<_, _>>()
        .map_err(|_| CheckError::Error("num_legs must be in min|max format".to_string()))?;
    let (min_legs, max_legs) = match bounds.as_slice() {
        [min, max] => (*min, *max),
        _ => return Err(CheckError::Error("num_legs must be in min|max format".to_string())),
    };

    let leg = pattern(r"<leg [^>]*>")?;
    for legs in itinerary_values(ctx.response.text(), "legs")? {
        let count = leg.find_iter(&legs).count();
        ensure(count >= min_legs && count <= max_legs, || {
            format!(
                "An itinerary returned was not between {} and {} legs.",
                min_legs, max_legs
            )
        })?;
    }
    Ok(())
}

fn invalid_modes(ctx: &CheckContext<'_>) -> CheckResult {
    let forbidden: BTreeSet<&str> = ctx
        .row
        .get("invalid_modes")
        .map(|v| v.items().into_iter().map(str::trim).collect())
        .unwrap_or_default();

    let mode = pattern(r#"<leg mode="([^"]*)""#)?;
    let found: BTreeSet<&str> = mode
        .captures_iter(ctx.response.text())
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();

    let bad: Vec<&str> = found.intersection(&forbidden).copied().collect();
    ensure(bad.is_empty(), || {
        format!("Invalid modes ({}) found in itinerary.", bad.join(", "))
    })
}

fn no_errors(ctx: &CheckContext<'_>) -> CheckResult {
    let error = pattern(r"<error><id>(.*?)</id>")?;
    match error.captures(ctx.response.text()) {
        Some(c) => Err(CheckError::Failure(format!("OTP returned error #{}", &c[1]))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Response;
    use std::time::Duration;

    const PLAN: &str = concat!(
        "<response><plan>",
        "<itinerary><duration>1000</duration><distance>5000.5</distance><legs>",
        r#"<leg mode="WALK" route=""></leg><leg mode="BUS" route="5"></leg>"#,
        "</legs></itinerary>",
        "<itinerary><duration>1100</duration><distance>5200</distance><legs>",
        r#"<leg mode="BICYCLE" route=""></leg>"#,
        "</legs></itinerary>",
        "</plan></response>"
    );

    fn today() -> NaiveDate {
        // a Wednesday
        NaiveDate::from_ymd_opt(2024, 5, 15).unwrap()
    }

    fn check(f: fn(&CheckContext<'_>) -> CheckResult, row: &ParameterRow, body: &str) -> CheckResult {
        let settings = RunSettings::new("http://localhost:8080/otp/", today());
        let response = Response {
            body: Some(body.to_string()),
            elapsed: Duration::from_millis(200),
            error: None,
        };
        f(&CheckContext {
            row,
            url: "http://localhost:8080/otp/routers/default/plan",
            response: &response,
            settings: &settings,
        })
    }

    #[test]
    fn test_service_date() {
        let wed = today();
        assert_eq!(service_date(None, wed), wed);
        assert_eq!(
            service_date(Some("Saturday"), wed),
            NaiveDate::from_ymd_opt(2024, 5, 18).unwrap()
        );
        assert_eq!(
            service_date(Some("Sunday"), wed),
            NaiveDate::from_ymd_opt(2024, 5, 19).unwrap()
        );
        assert_eq!(service_date(Some("Holiday"), wed), wed);

        let sat = NaiveDate::from_ymd_opt(2024, 5, 18).unwrap();
        assert_eq!(service_date(Some("Saturday"), sat), sat);
        let sun = NaiveDate::from_ymd_opt(2024, 5, 19).unwrap();
        assert_eq!(
            service_date(Some("Saturday"), sun),
            NaiveDate::from_ymd_opt(2024, 5, 25).unwrap()
        );
        assert_eq!(service_date(Some("Sunday"), sun), sun);
    }

    #[test]
    fn test_prepare_fills_date_and_decodes_places() {
        let settings = RunSettings::new("http://localhost:8080/otp/", today());
        let mut row = ParameterRow::from_pairs([
            ("fromPlace", "28.061239%2C-82.413752"),
            ("toPlace", "28.063654,-82.413532"),
            ("service", "Sunday"),
        ]);
        prepare(&mut row, &settings).unwrap();

        assert_eq!(row.text("fromPlace"), Some("28.061239,-82.413752"));
        assert_eq!(row.text("toPlace"), Some("28.063654,-82.413532"));
        assert_eq!(row.text("date"), Some("2024-05-19"));
    }

    #[test]
    fn test_prepare_decodes_only_percent_escapes() {
        let settings = RunSettings::new("http://localhost:8080/otp/", today());
        let mut row = ParameterRow::from_pairs([
            ("fromPlace", "Fowler+Ave%20%26%2056th=St"),
            ("toPlace", "+28.06%2C-82.41"),
        ]);
        prepare(&mut row, &settings).unwrap();

        assert_eq!(row.text("fromPlace"), Some("Fowler+Ave & 56th=St"));
        assert_eq!(row.text("toPlace"), Some("+28.06,-82.41"));
    }

    #[test]
    fn test_prepare_keeps_explicit_date() {
        let settings = RunSettings::new("http://localhost:8080/otp/", today());
        let mut row =
            ParameterRow::from_pairs([("fromPlace", "A"), ("toPlace", "B"), ("date", "2020-01-01")]);
        prepare(&mut row, &settings).unwrap();
        assert_eq!(row.text("date"), Some("2020-01-01"));
    }

    #[test]
    fn test_prepare_requires_coordinates() {
        let settings = RunSettings::new("http://localhost:8080/otp/", today());
        let mut row = ParameterRow::from_pairs([("fromPlace", "A")]);
        assert!(matches!(
            prepare(&mut row, &settings),
            Err(CheckError::Failure(_))
        ));
    }

    #[test]
    fn test_trip_duration() {
        let row = ParameterRow::from_pairs([("duration", "1000")]);
        assert_eq!(check(trip_duration, &row, PLAN), Ok(()));

        let row = ParameterRow::from_pairs([("duration", "500")]);
        assert!(matches!(
            check(trip_duration, &row, PLAN),
            Err(CheckError::Failure(_))
        ));

        let row = ParameterRow::from_pairs([("duration", "soon")]);
        assert!(matches!(
            check(trip_duration, &row, PLAN),
            Err(CheckError::Error(_))
        ));
    }

    #[test]
    fn test_trip_distance_accepts_fractional_values() {
        let row = ParameterRow::from_pairs([("distance", "5100")]);
        assert_eq!(check(trip_distance, &row, PLAN), Ok(()));
    }

    #[test]
    fn test_trip_num_legs() {
        let row = ParameterRow::from_pairs([("num_legs", "1|2")]);
        assert_eq!(check(trip_num_legs, &row, PLAN), Ok(()));

        let row = ParameterRow::from_pairs([("num_legs", "2|3")]);
        assert!(matches!(
            check(trip_num_legs, &row, PLAN),
            Err(CheckError::Failure(_))
        ));

        let row = ParameterRow::from_pairs([("num_legs", "3")]);
        assert_eq!(
            check(trip_num_legs, &row, PLAN),
            Err(CheckError::Error(
                "num_legs must be in min|max format".to_string()
            ))
        );
    }

    #[test]
    fn test_invalid_modes() {
        let row = ParameterRow::from_pairs([("invalid_modes", "['CAR', 'TRAM']")]);
        assert_eq!(check(invalid_modes, &row, PLAN), Ok(()));

        let row = ParameterRow::from_pairs([("invalid_modes", "['CAR', 'BUS']")]);
        assert_eq!(
            check(invalid_modes, &row, PLAN),
            Err(CheckError::Failure(
                "Invalid modes (BUS) found in itinerary.".to_string()
            ))
        );
    }

    #[test]
    fn test_expected_output() {
        let row = ParameterRow::from_pairs([("expected_output", r"mode=.BICYCLE")]);
        assert_eq!(check(expected_output, &row, PLAN), Ok(()));

        let row = ParameterRow::from_pairs([("expected_output", "FERRY")]);
        assert!(matches!(
            check(expected_output, &row, PLAN),
            Err(CheckError::Failure(_))
        ));

        let row = ParameterRow::from_pairs([("expected_output", "(")]);
        assert!(matches!(
            check(expected_output, &row, PLAN),
            Err(CheckError::Error(_))
        ));
    }

    #[test]
    fn test_no_errors() {
        let row = ParameterRow::new();
        assert_eq!(check(no_errors, &row, PLAN), Ok(()));
        assert_eq!(
            check(
                no_errors,
                &row,
                "<response><error><id>404</id><msg>PATH_NOT_FOUND</msg></error></response>"
            ),
            Err(CheckError::Failure("OTP returned error #404".to_string()))
        );
    }
}
