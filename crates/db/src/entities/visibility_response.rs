//! Visibility response entity - heavy per-question model output.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One model response to a visibility question, owned by a report run.
///
/// These rows carry the bulk of a run's data and are what the archive
/// worker migrates to cold storage.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "visibility_response")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Run this response belongs to.
    pub run_id: String,

    /// The question posed to the model.
    #[sea_orm(column_type = "Text")]
    pub question: String,

    /// Model that produced the response.
    pub model: String,

    /// Raw response text.
    #[sea_orm(column_type = "Text")]
    pub response: String,

    /// Provider metadata (token counts, latency, etc).
    pub metadata: Json,

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
