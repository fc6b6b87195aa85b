//! Report schedule date entity - explicit dates for CUSTOM schedules.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// An explicit generation date for a CUSTOM schedule.
///
/// Dates are unique per company; replacing a company's date list is a
/// full delete-then-insert inside one transaction.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "report_schedule_date")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Company this date belongs to.
    pub company_id: String,

    /// Local calendar date on which a report should be generated.
    pub date: Date,

    /// When the row was created.
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::company::Entity",
        from = "Column::CompanyId",
        to = "super::company::Column::Id"
    )]
    Company,
}

impl Related<super::company::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Company.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
