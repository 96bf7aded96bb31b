//! Read-only catalog queries for test cases.

use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::entity::test_case::{self, Entity as TestCaseEntity};
use crate::error::{AppError, AppResult};
use crate::models::{Action, TestCase};

use super::DbPool;

/// Convert a catalog row into the domain model, parsing the action array.
fn into_domain(row: test_case::Model) -> AppResult<TestCase> {
    let actions: Vec<Action> = serde_json::from_value(row.actions).map_err(|e| {
        AppError::Database(format!("Test case {} has malformed actions: {}", row.id, e))
    })?;

    Ok(TestCase {
        id: row.id,
        name: row.name,
        url: row.url,
        actions,
        module_id: row.module_id,
    })
}

impl DbPool {
    /// Fetch a single test case by id.
    pub async fn fetch_test_case(&self, id: Uuid) -> AppResult<Option<TestCase>> {
        let row = TestCaseEntity::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to fetch test case: {}", e)))?;

        row.map(into_domain).transpose()
    }

    /// Fetch the test cases of the given modules, filtered to the requesting
    /// user and project, ordered by creation time ascending.
    pub async fn fetch_test_cases_by_modules(
        &self,
        module_ids: &[Uuid],
        user_id: Option<Uuid>,
        project_id: Option<Uuid>,
    ) -> AppResult<Vec<TestCase>> {
        let mut select =
            TestCaseEntity::find().filter(test_case::Column::ModuleId.is_in(module_ids.to_vec()));

        if let Some(user_id) = user_id {
            select = select.filter(test_case::Column::UserId.eq(user_id));
        }
        if let Some(project_id) = project_id {
            select = select.filter(test_case::Column::ProjectId.eq(project_id));
        }

        let rows = select
            .order_by_asc(test_case::Column::CreatedAt)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to fetch test cases: {}", e)))?;

        rows.into_iter().map(into_domain).collect()
    }
}
