//! HTTP transport tests against a local mock server

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ott::http::{HttpTransport, ResponseFormat, Transport};
use ott::testing::{discover, ClassFilter, RunSettings, TestRun};
use ott::Error;

const TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn test_get_sends_accept_header() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/otp/routers/default/plan"))
        .and(header("accept", "application/xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<response/>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let url = format!("{}/otp/routers/default/plan", mock_server.uri());
    let body = HttpTransport::new()
        .get(&url, ResponseFormat::Xml, TIMEOUT)
        .await
        .expect("request failed");

    assert_eq!(body, "<response/>");
}

#[tokio::test]
async fn test_error_status_is_transport_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/otp/routers/default/bike_rental"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let url = format!("{}/otp/routers/default/bike_rental", mock_server.uri());
    let result = HttpTransport::new()
        .get(&url, ResponseFormat::Json, TIMEOUT)
        .await;

    match result {
        Err(Error::Transport { message, .. }) => assert!(message.contains("503")),
        other => panic!("Expected Transport error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("{}")
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&mock_server)
        .await;

    let result = HttpTransport::new()
        .get(&mock_server.uri(), ResponseFormat::Json, Duration::from_millis(200))
        .await;

    assert!(matches!(result, Err(Error::Timeout { .. })), "{:?}", result);
}

#[tokio::test]
async fn test_run_fetches_each_request_once() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/otp/"))
        .and(header("accept", "application/json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"serverVersion":{"major":1,"minor":0}}"#),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/otp/routers/default/plan"))
        .and(query_param("fromPlace", "28.05,-82.40"))
        .and(header("accept", "application/xml"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<response><plan/></response>"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let planner = dir.path().join("USFPlanner");
    std::fs::create_dir_all(&planner).unwrap();
    std::fs::write(
        planner.join("trips.csv"),
        "fromPlace,toPlace,req_OTPVersion,major,minor\n\
         \"28.05,-82.40\",\"28.06,-82.41\",test_version,1,0\n\
         \"28.05,-82.40\",\"28.06,-82.41\",test_version,1,0\n",
    )
    .unwrap();

    let settings = RunSettings::new(
        &format!("{}/otp", mock_server.uri()),
        NaiveDate::from_ymd_opt(2024, 5, 15).unwrap(),
    );
    let files = discover(dir.path()).unwrap();
    let transport = Arc::new(HttpTransport::new());
    let mut test_run = TestRun::new(settings, ClassFilter::default(), transport).quiet(true);
    test_run.run(&files).await.unwrap();

    let entry = &test_run.report().files["USFPlanner/trips.csv"];
    assert!(entry.pass.contains_key("test_no_errors:1"));
    assert!(entry.pass.contains_key("test_no_errors:2"));
    // the short planner body fails the size check on both rows
    assert!(entry.failures.contains_key("test_result_too_small:2"));
}
