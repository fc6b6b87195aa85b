//! Database migrations.
//!
//! Schema migrations for the database.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20250301_000001_create_company_table;
mod m20250301_000002_create_report_schedule_tables;
mod m20250301_000003_create_report_run_table;
mod m20250301_000004_create_response_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_company_table::Migration),
            Box::new(m20250301_000002_create_report_schedule_tables::Migration),
            Box::new(m20250301_000003_create_report_run_table::Migration),
            Box::new(m20250301_000004_create_response_tables::Migration),
        ]
    }
}
