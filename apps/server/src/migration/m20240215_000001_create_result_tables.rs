//! Creates the test_results (latest, upserted) and test_runs (history) tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TestResults::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(TestResults::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(TestResults::TestCaseId)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(TestResults::Name).string().not_null())
                    .col(ColumnDef::new(TestResults::UserId).uuid())
                    .col(ColumnDef::new(TestResults::ProjectId).uuid())
                    .col(ColumnDef::new(TestResults::ModuleId).uuid())
                    .col(ColumnDef::new(TestResults::Status).string().not_null())
                    .col(ColumnDef::new(TestResults::Result).json_binary().not_null())
                    .col(ColumnDef::new(TestResults::FailScreenshot).text())
                    .col(
                        ColumnDef::new(TestResults::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TestResults::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TestRuns::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(TestRuns::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(TestRuns::TestResultId).uuid().not_null())
                    .col(ColumnDef::new(TestRuns::TestCaseId).uuid().not_null())
                    .col(ColumnDef::new(TestRuns::Status).string().not_null())
                    .col(ColumnDef::new(TestRuns::Result).json_binary().not_null())
                    .col(
                        ColumnDef::new(TestRuns::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_test_runs_test_result")
                            .from(TestRuns::Table, TestRuns::TestResultId)
                            .to(TestResults::Table, TestResults::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_test_runs_test_case_id")
                    .table(TestRuns::Table)
                    .col(TestRuns::TestCaseId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TestRuns::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TestResults::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum TestResults {
    Table,
    Id,
    TestCaseId,
    Name,
    UserId,
    ProjectId,
    ModuleId,
    Status,
    Result,
    FailScreenshot,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum TestRuns {
    Table,
    Id,
    TestResultId,
    TestCaseId,
    Status,
    Result,
    CreatedAt,
}
