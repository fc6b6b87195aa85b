//! Company entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A tenant company tracked by the report pipeline.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "company")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Display name.
    pub name: String,

    /// Primary web domain, if known.
    #[sea_orm(nullable)]
    pub domain: Option<String>,

    /// When the company was created.
    pub created_at: DateTimeWithTimeZone,

    /// When the company was last updated.
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::report_run::Entity")]
    ReportRun,
    #[sea_orm(has_many = "super::report_schedule::Entity")]
    ReportSchedule,
}

impl Related<super::report_run::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReportRun.def()
    }
}

impl Related<super::report_schedule::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReportSchedule.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
