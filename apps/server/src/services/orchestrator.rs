//! Session orchestration: one request, one browser session, one or many test
//! cases, persisted results.

use serde_json::json;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::db::{DbPool, NewTestResult};
use crate::error::{AppError, AppResult};
use crate::models::{
    LoginMode, OverallReport, RunOutcome, RunRequest, RunStatus, StepResult, TestCase, TestReport,
};

use super::browser::BrowserSession;
use super::runner;

/// Execute a validated run request end to end.
///
/// One browser session is shared across the whole request (auth pre-steps
/// included) and is closed exactly once, on every exit path.
pub async fn execute(pool: &DbPool, config: &Config, request: &RunRequest) -> AppResult<RunOutcome> {
    let headless = request.headless.unwrap_or(config.browser.headless_default);
    let session = BrowserSession::launch(
        request.browser_name,
        headless,
        config.browser.network_idle_wait,
    )
    .await?;

    let outcome = run_with_session(pool, &session, request).await;
    session.close().await;
    outcome
}

async fn run_with_session(
    pool: &DbPool,
    session: &BrowserSession,
    request: &RunRequest,
) -> AppResult<RunOutcome> {
    if request.login_required {
        match request.login_mode {
            Some(LoginMode::Social) => {
                // validate() guarantees socialAuth is present here
                let auth = request.social_auth.as_ref().ok_or_else(|| {
                    AppError::Validation("socialAuth is required for social login".to_string())
                })?;
                let auth_case = pool
                    .fetch_test_case(auth.auth_test_case_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound("Auth test case".to_string()))?;

                info!(auth_case = %auth_case.id, "Running social login pre-test");
                let (auth_report, _) = run_test_case(session, &auth_case).await?;
                if auth_report.status == RunStatus::Fail {
                    warn!(auth_case = %auth_case.id, "Social login pre-test did not pass");
                }
                // Auth pre-test results are intentionally not persisted
            }
            Some(LoginMode::Otp) => {
                if let Some(otp) = &request.otp {
                    session.seed_storage(otp).await?;
                }
            }
            None => {}
        }
    }

    if let Some(test_case_id) = request.test_case_id {
        let test_case = pool
            .fetch_test_case(test_case_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Test case {test_case_id}")))?;

        let (report, screenshot) = match run_test_case(session, &test_case).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(test_case = %test_case.id, error = %e, "Test case execution failed");
                (synthetic_failure_report(&test_case, &e), None)
            }
        };
        persist_report(pool, request, &test_case, &report, screenshot).await;
        Ok(RunOutcome::Single(report))
    } else {
        let module_ids = request.module_ids.clone().unwrap_or_default();
        let auth_case_id = request.social_auth.as_ref().map(|a| a.auth_test_case_id);

        let fetched = pool
            .fetch_test_cases_by_modules(&module_ids, request.user_id, request.project_id)
            .await?;
        // The auth pre-test must not run again as a regular case
        let test_cases = exclude_auth_case(fetched, auth_case_id);

        info!(count = test_cases.len(), "Running test case batch");

        let mut reports = Vec::with_capacity(test_cases.len());
        for test_case in &test_cases {
            let (report, screenshot) = match run_test_case(session, test_case).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(test_case = %test_case.id, error = %e, "Test case execution failed");
                    (synthetic_failure_report(test_case, &e), None)
                }
            };
            persist_report(pool, request, test_case, &report, screenshot).await;
            reports.push(report);
        }

        Ok(RunOutcome::Batch(OverallReport::from_reports(reports)))
    }
}

/// Run one test case on the shared session: navigate to its starting URL,
/// execute steps with stop-on-failure, capture a screenshot when it failed.
async fn run_test_case(
    session: &BrowserSession,
    test_case: &TestCase,
) -> AppResult<(TestReport, Option<String>)> {
    if let Some(url) = &test_case.url {
        session.goto(url).await?;
    }

    let results = runner::run_steps(session, test_case).await;
    let report = TestReport::summarize(test_case.id, &test_case.name, results);

    let screenshot = if report.status == RunStatus::Fail {
        match session.screenshot_data_url().await {
            Ok(data_url) => Some(data_url),
            Err(e) => {
                warn!(test_case = %test_case.id, "Failed to capture failure screenshot: {e}");
                None
            }
        }
    } else {
        None
    };

    info!(
        test_case = %test_case.id,
        status = %report.status,
        passed = report.passed,
        failed = report.failed,
        "Test case finished"
    );

    Ok((report, screenshot))
}

/// Report for a test case that threw before producing step results.
fn synthetic_failure_report(test_case: &TestCase, error: &AppError) -> TestReport {
    let step = StepResult {
        sequence: 1,
        description: "Test execution".to_string(),
        status: RunStatus::Fail,
        message: error.to_string(),
        assertions: Vec::new(),
    };
    TestReport::summarize(test_case.id, &test_case.name, vec![step])
}

/// Persist one test case's report. Fire-and-log: persistence failures never
/// affect the run outcome.
async fn persist_report(
    pool: &DbPool,
    request: &RunRequest,
    test_case: &TestCase,
    report: &TestReport,
    fail_screenshot: Option<String>,
) {
    let new = NewTestResult {
        test_case_id: test_case.id,
        name: test_case.name.clone(),
        user_id: request.user_id,
        project_id: request.project_id,
        module_id: test_case.module_id,
        status: report.status,
        result: result_payload(report),
        fail_screenshot,
    };

    if let Err(e) = pool.save_test_results(new).await {
        warn!(test_case = %test_case.id, "Failed to persist test result: {e}");
    }
}

/// Structured result column stored with the latest-result row and each
/// run-history row.
fn result_payload(report: &TestReport) -> serde_json::Value {
    json!({
        "passed": report.passed,
        "failed": report.failed,
        "skipped": report.skipped,
        "total": report.total,
        "results": report.results,
        "status": report.status_line(),
        "run_by": "cloud",
    })
}

/// Drop the social-auth pre-test from a batch.
fn exclude_auth_case(test_cases: Vec<TestCase>, auth_case_id: Option<Uuid>) -> Vec<TestCase> {
    test_cases
        .into_iter()
        .filter(|c| Some(c.id) != auth_case_id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_case(id: Uuid) -> TestCase {
        TestCase {
            id,
            name: "case".to_string(),
            url: None,
            actions: Vec::new(),
            module_id: None,
        }
    }

    #[test]
    fn batch_excludes_auth_case() {
        let auth_id = Uuid::now_v7();
        let other_id = Uuid::now_v7();
        let cases = vec![test_case(auth_id), test_case(other_id)];

        let filtered = exclude_auth_case(cases, Some(auth_id));
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, other_id);
    }

    #[test]
    fn batch_without_auth_case_is_untouched() {
        let cases = vec![test_case(Uuid::now_v7()), test_case(Uuid::now_v7())];
        assert_eq!(exclude_auth_case(cases, None).len(), 2);
    }

    #[test]
    fn synthetic_report_is_single_failure() {
        let case = test_case(Uuid::now_v7());
        let report =
            synthetic_failure_report(&case, &AppError::Browser("page crashed".to_string()));

        assert_eq!(report.status, RunStatus::Fail);
        assert_eq!(report.total, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.results[0].sequence, 1);
        assert!(report.results[0].message.contains("page crashed"));
    }

    #[test]
    fn result_payload_carries_counts_and_origin() {
        let report = TestReport::summarize(Uuid::nil(), "case", Vec::new());
        let payload = result_payload(&report);

        assert_eq!(payload["run_by"], "cloud");
        assert_eq!(payload["total"], 0);
        assert_eq!(payload["status"], "All 0 steps passed");
    }
}
