//! Report schedule entity - per-company generation policy.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Per-company report generation policy.
///
/// `mode` is stored as free text rather than a database enum so that an
/// unrecognized value survives row decoding; the decision engine treats
/// unknown modes as "generate" (fail open).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "report_schedule")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Company this schedule belongs to. One schedule per company.
    #[sea_orm(unique)]
    pub company_id: String,

    /// Scheduling mode: MANUAL, DAILY, WEEKLY or CUSTOM.
    pub mode: String,

    /// IANA timezone name the policy is evaluated in.
    pub timezone: String,

    /// Days of week for WEEKLY mode (JSON array of 0-6, 0 = Sunday).
    pub weekly_days: Json,

    /// When the schedule was created.
    pub created_at: DateTimeWithTimeZone,

    /// When the schedule was last updated.
    pub updated_at: Option<DateTimeWithTimeZone>,
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
