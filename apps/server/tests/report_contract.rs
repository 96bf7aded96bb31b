//! Contract tests for the wire models: request parsing/validation and report
//! shape, exercised the way the API surface sees them.

use serde_json::json;
use uuid::Uuid;

use automation_server::models::{
    Action, ActionKind, BrowserEngine, RunOutcome, RunStatus, StepResult, TestCase, TestReport,
};
use automation_server::models::{OverallReport, RunRequest};

fn parse_request(value: serde_json::Value) -> RunRequest {
    serde_json::from_value(value).expect("request should deserialize")
}

#[test]
fn single_case_request_round_trips() {
    let id = Uuid::now_v7();
    let mut request = parse_request(json!({
        "testCaseId": id,
        "browserName": "firefox",
        "headless": false
    }));

    request.validate().expect("request should validate");
    assert_eq!(request.test_case_id, Some(id));
    assert_eq!(request.browser_name, BrowserEngine::Firefox);
    assert_eq!(request.headless, Some(false));
}

#[test]
fn batch_request_with_otp_defaults() {
    let mut request = parse_request(json!({
        "moduleIds": [Uuid::now_v7()],
        "loginRequired": true,
        "loginMode": "otp",
        "otp": { "storageType": "sessionStorage", "object": { "token": "abc" } }
    }));

    request.validate().expect("request should validate");
    let entries = request.otp.unwrap().entries().unwrap();
    assert_eq!(entries, vec![("token".to_string(), "abc".to_string())]);
}

#[test]
fn invalid_request_is_rejected_before_any_work() {
    let mut request = parse_request(json!({ "browserName": "webkit" }));
    assert!(request.validate().is_err());
}

#[test]
fn recorded_test_case_parses_with_mixed_actions() {
    let test_case: TestCase = serde_json::from_value(json!({
        "id": Uuid::now_v7(),
        "name": "signup flow",
        "url": "https://example.org/",
        "actions": [
            {
                "type": "change",
                "sequence": 1,
                "element": { "uniqueSelector": "#email", "xpath": "//input[@id='email']" },
                "variable": { "name": "randomEmail", "length": 8 },
                "assertions": { "ValidEmail": {} }
            },
            { "type": "Enter", "sequence": 2 },
            { "type": "teleport", "sequence": 3 }
        ]
    }))
    .expect("test case should deserialize");

    let kinds: Vec<ActionKind> = test_case.actions.iter().map(Action::kind).collect();
    assert_eq!(
        kinds,
        vec![
            ActionKind::Change,
            ActionKind::Key("Enter"),
            ActionKind::Unknown("teleport")
        ]
    );
}

fn step(sequence: u32, status: RunStatus, message: &str) -> StepResult {
    StepResult {
        sequence,
        description: format!("step {sequence}"),
        status,
        message: message.to_string(),
        assertions: Vec::new(),
    }
}

#[test]
fn stop_on_failure_report_shape() {
    // Three authored actions, second failed: the runner records exactly two
    // steps and the failure is last.
    let results = vec![
        step(1, RunStatus::Pass, "Navigated to https://example.org"),
        step(2, RunStatus::Fail, "Element not found: selector=None xpath candidates=1"),
    ];
    let report = TestReport::summarize(Uuid::now_v7(), "checkout", results);

    assert_eq!(report.total, 2);
    assert_eq!(report.results.last().unwrap().status, RunStatus::Fail);
    assert_eq!(report.passed + report.failed + report.skipped, report.total);
    assert_eq!(report.status, RunStatus::Fail);
}

#[test]
fn run_outcome_serializes_transparently() {
    let single = RunOutcome::Single(TestReport::summarize(Uuid::nil(), "one", Vec::new()));
    let value = serde_json::to_value(&single).unwrap();
    // Untagged: the report fields sit at the top level of the response body
    assert!(value.get("testCaseId").is_some());
    assert!(value.get("results").is_some());

    let batch = RunOutcome::Batch(OverallReport::from_reports(vec![TestReport::summarize(
        Uuid::nil(),
        "one",
        Vec::new(),
    )]));
    let value = serde_json::to_value(&batch).unwrap();
    assert_eq!(value["totalTestCases"], 1);
    assert!(value.get("testCases").is_some());
}
