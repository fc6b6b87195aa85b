//! Benchmark response entity - heavy competitor comparison output.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One competitor-benchmark response, owned by a report run.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "benchmark_response")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Run this response belongs to.
    pub run_id: String,

    /// Competitor the benchmark was run against.
    pub competitor: String,

    /// Model that produced the response.
    pub model: String,

    /// Raw response text.
    #[sea_orm(column_type = "Text")]
    pub response: String,

    /// Extracted benchmark score, if scoring succeeded.
    #[sea_orm(nullable)]
    pub score: Option<f64>,

    /// When the response was recorded.
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::report_run::Entity",
        from = "Column::RunId",
        to = "super::report_run::Column::Id"
    )]
    ReportRun,
}

impl Related<super::report_run::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReportRun.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
