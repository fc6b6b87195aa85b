//! Report schedule repository.

use std::sync::Arc;

use beacon_common::{AppError, AppResult, IdGenerator};
use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

use crate::entities::{report_schedule, report_schedule_date};

/// Input for creating or replacing a company's schedule policy.
#[derive(Debug, Clone)]
pub struct UpsertScheduleInput {
    pub mode: String,
    pub timezone: String,
    pub weekly_days: Vec<u8>,
}

/// Repository for schedule policy and explicit date lists.
#[derive(Clone)]
pub struct ReportScheduleRepository {
    db: Arc<DatabaseConnection>,
    id_gen: IdGenerator,
}

impl ReportScheduleRepository {
    /// Create a new report schedule repository.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            db,
            id_gen: IdGenerator::new(),
        }
    }

    /// Find the schedule for a company, if one has been persisted.
    pub async fn find_by_company(
        &self,
        company_id: &str,
    ) -> AppResult<Option<report_schedule::Model>> {
        report_schedule::Entity::find()
            .filter(report_schedule::Column::CompanyId.eq(company_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the explicit schedule dates for a company, earliest first.
    pub async fn find_dates_by_company(
        &self,
        company_id: &str,
    ) -> AppResult<Vec<report_schedule_date::Model>> {
        report_schedule_date::Entity::find()
            .filter(report_schedule_date::Column::CompanyId.eq(company_id))
            .order_by_asc(report_schedule_date::Column::Date)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or replace the schedule policy for a company.
    pub async fn upsert(
        &self,
        company_id: &str,
        input: UpsertScheduleInput,
    ) -> AppResult<report_schedule::Model> {
        let now = Utc::now().fixed_offset();
        let weekly_days = serde_json::json!(input.weekly_days);

        match self.find_by_company(company_id).await? {
            Some(existing) => {
                let mut model: report_schedule::ActiveModel = existing.into();
                model.mode = Set(input.mode);
                model.timezone = Set(input.timezone);
                model.weekly_days = Set(weekly_days);
                model.updated_at = Set(Some(now));

                model
                    .update(self.db.as_ref())
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))
            }
            None => {
                let model = report_schedule::ActiveModel {
                    id: Set(self.id_gen.generate()),
                    company_id: Set(company_id.to_string()),
                    mode: Set(input.mode),
                    timezone: Set(input.timezone),
                    weekly_days: Set(weekly_days),
                    created_at: Set(now),
                    updated_at: Set(None),
                };

                model
                    .insert(self.db.as_ref())
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))
            }
        }
    }

    /// Replace a company's explicit date list.
    ///
    /// Full delete-then-insert in a single transaction; a partial update
    /// of the date list is never observable.
    pub async fn replace_dates(&self, company_id: &str, dates: &[NaiveDate]) -> AppResult<usize> {
        let now = Utc::now().fixed_offset();

        let rows: Vec<report_schedule_date::ActiveModel> = dates
            .iter()
            .map(|date| report_schedule_date::ActiveModel {
                id: Set(self.id_gen.generate()),
                company_id: Set(company_id.to_string()),
                date: Set(*date),
                created_at: Set(now),
            })
            .collect();

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        report_schedule_date::Entity::delete_many()
            .filter(report_schedule_date::Column::CompanyId.eq(company_id))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if !rows.is_empty() {
            report_schedule_date::Entity::insert_many(rows)
                .exec(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(dates.len())
    }

    /// Delete a company's schedule and its date list.
    pub async fn delete_by_company(&self, company_id: &str) -> AppResult<()> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        report_schedule_date::Entity::delete_many()
            .filter(report_schedule_date::Column::CompanyId.eq(company_id))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        report_schedule::Entity::delete_many()
            .filter(report_schedule::Column::CompanyId.eq(company_id))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    #[tokio::test]
    async fn test_replace_dates_is_delete_then_insert() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([
                // delete existing dates
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 2,
                },
                // insert replacements
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 2,
                },
            ])
            .into_connection();

        let repo = ReportScheduleRepository::new(Arc::new(db));
        let dates = vec![
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 5, 15).unwrap(),
        ];

        let inserted = repo.replace_dates("c1", &dates).await.unwrap();
        assert_eq!(inserted, 2);
    }

    #[tokio::test]
    async fn test_replace_dates_with_empty_list_only_deletes() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 3,
            }])
            .into_connection();

        let repo = ReportScheduleRepository::new(Arc::new(db));
        let inserted = repo.replace_dates("c1", &[]).await.unwrap();
        assert_eq!(inserted, 0);
    }
}
