//! Create the visibility_response and benchmark_response tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create visibility_response table
        manager
            .create_table(
                Table::create()
                    .table(VisibilityResponse::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VisibilityResponse::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(VisibilityResponse::RunId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VisibilityResponse::Question)
                            .text()
                            .not_null(),
                    )
                    .col(ColumnDef::new(VisibilityResponse::Model).string().not_null())
                    .col(
                        ColumnDef::new(VisibilityResponse::Response)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VisibilityResponse::Metadata)
                            .json()
                            .not_null()
                            .default("{}"),
                    )
                    .col(
                        ColumnDef::new(VisibilityResponse::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(VisibilityResponse::Table, VisibilityResponse::RunId)
                            .to(ReportRun::Table, ReportRun::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_visibility_response_run_id")
                    .table(VisibilityResponse::Table)
                    .col(VisibilityResponse::RunId)
                    .to_owned(),
            )
            .await?;

        // Create benchmark_response table
        manager
            .create_table(
                Table::create()
                    .table(BenchmarkResponse::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BenchmarkResponse::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BenchmarkResponse::RunId).string().not_null())
                    .col(
                        ColumnDef::new(BenchmarkResponse::Competitor)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(BenchmarkResponse::Model).string().not_null())
                    .col(
                        ColumnDef::new(BenchmarkResponse::Response)
                            .text()
                            .not_null(),
                    )
                    .col(ColumnDef::new(BenchmarkResponse::Score).double().null())
                    .col(
                        ColumnDef::new(BenchmarkResponse::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(BenchmarkResponse::Table, BenchmarkResponse::RunId)
                            .to(ReportRun::Table, ReportRun::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_benchmark_response_run_id")
                    .table(BenchmarkResponse::Table)
                    .col(BenchmarkResponse::RunId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BenchmarkResponse::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(VisibilityResponse::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum VisibilityResponse {
    Table,
    Id,
    RunId,
    Question,
    Model,
    Response,
    Metadata,
    CreatedAt,
}

#[derive(DeriveIden)]
enum BenchmarkResponse {
    Table,
    Id,
    RunId,
    Competitor,
    Model,
    Response,
    Score,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ReportRun {
    Table,
    Id,
}
