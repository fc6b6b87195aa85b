//! Create the report_run table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ReportRun::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ReportRun::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ReportRun::CompanyId).string().not_null())
                    .col(
                        ColumnDef::new(ReportRun::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(ReportRun::StepStatus).string().null())
                    .col(ColumnDef::new(ReportRun::ArchiveId).string().null())
                    .col(
                        ColumnDef::new(ReportRun::ArchivedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ReportRun::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReportRun::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(ReportRun::Table, ReportRun::CompanyId)
                            .to(Company::Table, Company::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // The archive worker reads per-company runs ordered by creation time
        manager
            .create_index(
                Index::create()
                    .name("idx_report_run_company_created_at")
                    .table(ReportRun::Table)
                    .col(ReportRun::CompanyId)
                    .col(ReportRun::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_report_run_status")
                    .table(ReportRun::Table)
                    .col(ReportRun::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ReportRun::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum ReportRun {
    Table,
    Id,
    CompanyId,
    Status,
    StepStatus,
    ArchiveId,
    ArchivedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Company {
    Table,
    Id,
}
