//! Execution report models: per-step, per-test-case, and per-batch.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::test_case::Action;

/// Pass/fail outcome shared by steps, test cases, and batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Pass,
    Fail,
}

impl RunStatus {
    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of a single assertion evaluated after an action.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AssertionResult {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    pub success: bool,
}

/// Outcome of one executed step: the action result folded together with its
/// assertion results.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StepResult {
    pub sequence: u32,
    pub description: String,
    pub status: RunStatus,
    pub message: String,
    pub assertions: Vec<AssertionResult>,
}

impl StepResult {
    /// Build a step result, applying the ordinal and description fallbacks.
    pub fn for_action(
        action: &Action,
        index: usize,
        status: RunStatus,
        message: String,
        assertions: Vec<AssertionResult>,
    ) -> Self {
        StepResult {
            sequence: action.sequence.unwrap_or(index as u32 + 1),
            description: action.display_description().to_string(),
            status,
            message,
            assertions,
        }
    }
}

/// Summary of a single test case execution.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TestReport {
    pub test_case_id: Uuid,
    pub test_case_name: String,
    pub status: RunStatus,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub total: usize,
    pub results: Vec<StepResult>,
}

impl TestReport {
    /// Summarize step results into a per-test-case report.
    ///
    /// `total` always equals `passed + failed + skipped`; `skipped` is zero
    /// under the current stop-on-failure policy.
    pub fn summarize(test_case_id: Uuid, test_case_name: &str, results: Vec<StepResult>) -> Self {
        let passed = results
            .iter()
            .filter(|r| r.status == RunStatus::Pass)
            .count();
        let failed = results.len() - passed;

        TestReport {
            test_case_id,
            test_case_name: test_case_name.to_string(),
            status: if failed == 0 {
                RunStatus::Pass
            } else {
                RunStatus::Fail
            },
            passed,
            failed,
            skipped: 0,
            total: results.len(),
            results,
        }
    }

    /// Human-readable status line stored alongside the structured counts.
    pub fn status_line(&self) -> String {
        match self.status {
            RunStatus::Pass => format!("All {} steps passed", self.total),
            RunStatus::Fail => format!("{} of {} steps passed", self.passed, self.total),
        }
    }
}

/// Aggregation over a batch of test cases.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OverallReport {
    pub status: RunStatus,
    pub total_test_cases: usize,
    pub passed: usize,
    pub failed: usize,
    pub test_cases: Vec<TestReport>,
}

impl OverallReport {
    /// Aggregate per-test-case reports into a batch report.
    pub fn from_reports(reports: Vec<TestReport>) -> Self {
        let passed = reports
            .iter()
            .filter(|r| r.status == RunStatus::Pass)
            .count();
        let failed = reports.len() - passed;

        OverallReport {
            status: if failed == 0 {
                RunStatus::Pass
            } else {
                RunStatus::Fail
            },
            total_test_cases: reports.len(),
            passed,
            failed,
            test_cases: reports,
        }
    }
}

/// Response body of a run: a single report or a batch aggregation.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum RunOutcome {
    Single(TestReport),
    Batch(OverallReport),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn step(sequence: u32, status: RunStatus) -> StepResult {
        StepResult {
            sequence,
            description: "step".into(),
            status,
            message: String::new(),
            assertions: Vec::new(),
        }
    }

    #[test]
    fn summary_counts_are_consistent() {
        let report = TestReport::summarize(
            Uuid::nil(),
            "login",
            vec![
                step(1, RunStatus::Pass),
                step(2, RunStatus::Pass),
                step(3, RunStatus::Fail),
            ],
        );

        assert_eq!(report.total, 3);
        assert_eq!(report.passed + report.failed + report.skipped, report.total);
        assert_eq!(report.skipped, 0);
        assert_eq!(report.status, RunStatus::Fail);
        assert_eq!(report.status_line(), "2 of 3 steps passed");
    }

    #[test]
    fn empty_run_passes() {
        let report = TestReport::summarize(Uuid::nil(), "empty", Vec::new());
        assert_eq!(report.status, RunStatus::Pass);
        assert_eq!(report.total, 0);
    }

    #[test]
    fn sequence_falls_back_to_list_position() {
        let action: Action = serde_json::from_value(json!({ "type": "change" })).unwrap();
        let result =
            StepResult::for_action(&action, 4, RunStatus::Pass, "ok".into(), Vec::new());
        assert_eq!(result.sequence, 5);

        let numbered: Action =
            serde_json::from_value(json!({ "type": "change", "sequence": 9 })).unwrap();
        let result =
            StepResult::for_action(&numbered, 0, RunStatus::Pass, "ok".into(), Vec::new());
        assert_eq!(result.sequence, 9);
    }

    #[test]
    fn batch_aggregation_counts_failures() {
        let pass = TestReport::summarize(Uuid::nil(), "a", vec![step(1, RunStatus::Pass)]);
        let fail = TestReport::summarize(Uuid::nil(), "b", vec![step(1, RunStatus::Fail)]);

        let overall = OverallReport::from_reports(vec![pass, fail]);
        assert_eq!(overall.total_test_cases, 2);
        assert_eq!(overall.passed, 1);
        assert_eq!(overall.failed, 1);
        assert_eq!(overall.status, RunStatus::Fail);
    }

    #[test]
    fn report_serializes_camel_case() {
        let report = TestReport::summarize(Uuid::nil(), "case", Vec::new());
        let value = serde_json::to_value(&report).unwrap();
        assert!(value.get("testCaseId").is_some());
        assert!(value.get("testCaseName").is_some());
        assert_eq!(value.get("status").unwrap(), "pass");
    }
}
