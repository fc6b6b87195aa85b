//! Report run entity - one execution of the report pipeline.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Report run status.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum RunStatus {
    /// Created, generation not yet started.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Generation in progress.
    #[sea_orm(string_value = "running")]
    Running,
    /// Generation finished successfully. Terminal.
    #[sea_orm(string_value = "completed")]
    Completed,
    /// Generation failed. Terminal.
    #[sea_orm(string_value = "failed")]
    Failed,
}

impl RunStatus {
    /// Whether this status is terminal.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// One execution of the report-generation pipeline for a company.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "report_run")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Company this run belongs to.
    pub company_id: String,

    /// Current run status.
    pub status: RunStatus,

    /// Free-text progress marker written by the report worker.
    #[sea_orm(nullable)]
    pub step_status: Option<String>,

    /// Cold-storage archive id, set once the run's heavy response data
    /// has been migrated out of the hot store.
    #[sea_orm(nullable)]
    pub archive_id: Option<String>,

    /// When the run's responses were archived.
    #[sea_orm(nullable)]
    pub archived_at: Option<DateTimeWithTimeZone>,

    /// When the run was created.
    pub created_at: DateTimeWithTimeZone,

    /// When the run was last updated.
    pub updated_at: Option<DateTimeWithTimeZone>,
}

impl Model {
    /// Whether the run's heavy data has been migrated to cold storage.
    #[must_use]
    pub const fn is_archived(&self) -> bool {
        self.archive_id.is_some()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::company::Entity",
        from = "Column::CompanyId",
        to = "super::company::Column::Id"
    )]
    Company,
    #[sea_orm(has_many = "super::visibility_response::Entity")]
    VisibilityResponse,
    #[sea_orm(has_many = "super::benchmark_response::Entity")]
    BenchmarkResponse,
}

impl Related<super::company::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Company.def()
    }
}

impl Related<super::visibility_response::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VisibilityResponse.def()
    }
}

impl Related<super::benchmark_response::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BenchmarkResponse.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
