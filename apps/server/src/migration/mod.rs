//! Database migrations for the tables this service owns.
//!
//! The `test_cases` catalog table belongs to the authoring application and is
//! intentionally not managed here.

use sea_orm_migration::prelude::*;

mod m20240215_000001_create_result_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20240215_000001_create_result_tables::Migration)]
    }
}
