//! Result persistence: latest-result upsert plus run-history append.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::entity::test_result::{
    self, ActiveModel as TestResultActiveModel, Entity as TestResult,
};
use crate::entity::test_run::ActiveModel as TestRunActiveModel;
use crate::error::{AppError, AppResult};
use crate::models::RunStatus;

use super::DbPool;

/// A result to be persisted for one test case execution.
pub struct NewTestResult {
    pub test_case_id: Uuid,
    pub name: String,
    pub user_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub module_id: Option<Uuid>,
    pub status: RunStatus,
    /// Structured result payload (counts, step results, human status, run_by).
    pub result: JsonValue,
    pub fail_screenshot: Option<String>,
}

impl DbPool {
    /// Persist one execution: upsert the latest-result row keyed by
    /// `test_case_id`, then append a run-history row linking it.
    pub async fn save_test_results(&self, new: NewTestResult) -> AppResult<()> {
        let now = Utc::now();

        let existing = TestResult::find()
            .filter(test_result::Column::TestCaseId.eq(new.test_case_id))
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to look up test result: {}", e)))?;

        let result_id = match existing {
            Some(row) => {
                let id = row.id;
                let mut model: TestResultActiveModel = row.into();
                model.name = Set(new.name.clone());
                model.user_id = Set(new.user_id);
                model.project_id = Set(new.project_id);
                model.module_id = Set(new.module_id);
                model.status = Set(new.status.as_str().to_string());
                model.result = Set(new.result.clone());
                model.fail_screenshot = Set(new.fail_screenshot.clone());
                model.updated_at = Set(now);
                model
                    .update(self.connection())
                    .await
                    .map_err(|e| AppError::Database(format!("Failed to update test result: {}", e)))?;
                id
            }
            None => {
                let id = Uuid::now_v7();
                let model = TestResultActiveModel {
                    id: Set(id),
                    test_case_id: Set(new.test_case_id),
                    name: Set(new.name.clone()),
                    user_id: Set(new.user_id),
                    project_id: Set(new.project_id),
                    module_id: Set(new.module_id),
                    status: Set(new.status.as_str().to_string()),
                    result: Set(new.result.clone()),
                    fail_screenshot: Set(new.fail_screenshot.clone()),
                    created_at: Set(now),
                    updated_at: Set(now),
                };
                model
                    .insert(self.connection())
                    .await
                    .map_err(|e| AppError::Database(format!("Failed to insert test result: {}", e)))?;
                id
            }
        };

        let run = TestRunActiveModel {
            id: Set(Uuid::now_v7()),
            test_result_id: Set(result_id),
            test_case_id: Set(new.test_case_id),
            status: Set(new.status.as_str().to_string()),
            result: Set(new.result),
            created_at: Set(now),
        };
        run.insert(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to append run history: {}", e)))?;

        Ok(())
    }
}
