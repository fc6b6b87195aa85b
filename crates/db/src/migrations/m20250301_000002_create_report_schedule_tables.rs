//! Create the report_schedule and report_schedule_date tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create report_schedule table
        manager
            .create_table(
                Table::create()
                    .table(ReportSchedule::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ReportSchedule::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ReportSchedule::CompanyId)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(ReportSchedule::Mode)
                            .string()
                            .not_null()
                            .default("DAILY"),
                    )
                    .col(
                        ColumnDef::new(ReportSchedule::Timezone)
                            .string()
                            .not_null()
                            .default("UTC"),
                    )
                    .col(
                        ColumnDef::new(ReportSchedule::WeeklyDays)
                            .json()
                            .not_null()
                            .default("[]"),
                    )
                    .col(
                        ColumnDef::new(ReportSchedule::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReportSchedule::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(ReportSchedule::Table, ReportSchedule::CompanyId)
                            .to(Company::Table, Company::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create report_schedule_date table
        manager
            .create_table(
                Table::create()
                    .table(ReportScheduleDate::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ReportScheduleDate::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ReportScheduleDate::CompanyId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ReportScheduleDate::Date).date().not_null())
                    .col(
                        ColumnDef::new(ReportScheduleDate::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(ReportScheduleDate::Table, ReportScheduleDate::CompanyId)
                            .to(Company::Table, Company::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Dates are unique per company
        manager
            .create_index(
                Index::create()
                    .name("idx_report_schedule_date_company_date")
                    .table(ReportScheduleDate::Table)
                    .col(ReportScheduleDate::CompanyId)
                    .col(ReportScheduleDate::Date)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ReportScheduleDate::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ReportSchedule::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum ReportSchedule {
    Table,
    Id,
    CompanyId,
    Mode,
    Timezone,
    WeeklyDays,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ReportScheduleDate {
    Table,
    Id,
    CompanyId,
    Date,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Company {
    Table,
    Id,
}
