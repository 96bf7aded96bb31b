//! Step iteration over a test case's action list.
//!
//! The runner borrows the browser session and never closes it; session
//! lifecycle belongs to the orchestrator.

use std::time::Duration;
use tracing::info;

use crate::models::{RunStatus, StepResult, TestCase};

use super::browser::BrowserSession;
use super::interpreter;

/// Post-step delay applied when the action does not specify one.
const DEFAULT_STEP_WAIT_SECS: f64 = 1.0;

/// Run a test case's actions with stop-on-failure semantics: the first step
/// that fails (or errors) is recorded and ends the test case.
pub async fn run_steps(session: &BrowserSession, test_case: &TestCase) -> Vec<StepResult> {
    let mut results = Vec::with_capacity(test_case.actions.len());

    for (index, action) in test_case.actions.iter().enumerate() {
        let next = test_case.actions.get(index + 1);
        let outcome = interpreter::run_action(session, action, next).await;

        let status = if outcome.success {
            RunStatus::Pass
        } else {
            RunStatus::Fail
        };
        info!(
            test_case = %test_case.id,
            step = index + 1,
            kind = %action.action_type,
            status = %status,
            "Step finished"
        );

        let step =
            StepResult::for_action(action, index, status, outcome.message, outcome.assertions);
        results.push(step);

        if status == RunStatus::Fail {
            break;
        }

        let wait = action.wait.unwrap_or(DEFAULT_STEP_WAIT_SECS);
        if wait > 0.0 {
            tokio::time::sleep(Duration::from_secs_f64(wait)).await;
        }
    }

    results
}

/// Legacy best-effort iteration kept for the manual harness: failed steps do
/// not end the run, only a thrown error does.
pub async fn run_steps_best_effort(
    session: &BrowserSession,
    test_case: &TestCase,
) -> Vec<StepResult> {
    let mut results = Vec::with_capacity(test_case.actions.len());

    for (index, action) in test_case.actions.iter().enumerate() {
        let next = test_case.actions.get(index + 1);
        match interpreter::try_run_action(session, action, next).await {
            Ok(outcome) => {
                let status = if outcome.success {
                    RunStatus::Pass
                } else {
                    RunStatus::Fail
                };
                results.push(StepResult::for_action(
                    action,
                    index,
                    status,
                    outcome.message,
                    outcome.assertions,
                ));
            }
            Err(e) => {
                results.push(StepResult::for_action(
                    action,
                    index,
                    RunStatus::Fail,
                    e.to_string(),
                    Vec::new(),
                ));
                break;
            }
        }

        let wait = action.wait.unwrap_or(DEFAULT_STEP_WAIT_SECS);
        if wait > 0.0 {
            tokio::time::sleep(Duration::from_secs_f64(wait)).await;
        }
    }

    results
}
