//! TestResult entity for SeaORM: the latest result per test case, upserted.

use sea_orm::entity::prelude::*;
use serde_json::Value as JsonValue;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "test_results")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub test_case_id: Uuid,
    pub name: String,
    pub user_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub module_id: Option<Uuid>,
    pub status: String,
    #[sea_orm(column_type = "JsonBinary")]
    pub result: JsonValue,
    /// Failure screenshot as a PNG data URL.
    #[sea_orm(column_type = "Text", nullable)]
    pub fail_screenshot: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::test_run::Entity")]
    TestRun,
}

impl Related<super::test_run::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TestRun.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
